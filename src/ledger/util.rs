use anyhow::Result;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// True when a `try_lock_*` call failed because another handle holds the lock,
/// as opposed to the lock call itself being unsupported or broken.
pub fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    let contended = fs2::lock_contended_error();
    err.raw_os_error().is_some() && err.raw_os_error() == contended.raw_os_error()
}
