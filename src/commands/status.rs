use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::ledger::config::load_config;
use crate::ledger::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/timeledger_env_allowlist.rs"));

/// Allowlisted variables that are currently set to something non-blank.
pub fn env_overrides() -> Vec<&'static str> {
    GENERATED_TIMELEDGER_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| env::var(key).is_ok_and(|v| !v.trim().is_empty()))
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));
    if !paths.config_file.exists() {
        report.detail("config file absent; using defaults");
    }

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("data_start_row={}", cfg.layout.data_start_row));
            report.detail(format!("approval_pattern={}", cfg.policy.approval_pattern));
            report.detail(format!("status_label={}", cfg.policy.status_label));
            report.detail(format!("reference_sheet={}", cfg.reference.sheet));
            report.detail(format!("reference_header={}", cfg.reference.header));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    let overrides = env_overrides();
    if overrides.is_empty() {
        report.detail("env_overrides=none");
    } else {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }

    Ok(report)
}
