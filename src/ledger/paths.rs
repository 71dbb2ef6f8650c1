use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LedgerPaths {
    pub home: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// Home directory for timeledger state; `TIMELEDGER_HOME` wins over
/// `~/.timeledger`.
pub fn resolve_home() -> Result<PathBuf> {
    match env::var("TIMELEDGER_HOME") {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        _ => Ok(required_home_dir()?.join(".timeledger")),
    }
}

pub fn resolve_paths() -> Result<LedgerPaths> {
    let home = resolve_home()?;
    let logs_dir = env_or_default_path("TIMELEDGER_LOGS_DIR", home.join("logs"));
    let config_file = env_or_default_path("TIMELEDGER_CONFIG_PATH", home.join("timeledger.toml"));

    Ok(LedgerPaths {
        home,
        logs_dir,
        config_file,
    })
}
