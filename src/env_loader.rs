use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(ledger_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = ledger_home.or_else(|| home_dir.map(|home| home.join(".timeledger")))?;
    Some(base.join(".env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("TIMELEDGER_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
