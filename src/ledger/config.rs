use crate::ledger::admission::{ApprovalPolicy, DEFAULT_APPROVAL_PATTERN};
use crate::ledger::paths::LedgerPaths;
use crate::ledger::store::StoreLayout;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub data_start_row: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { data_start_row: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub approval_pattern: String,
    #[serde(default = "default_status_label")]
    pub status_label: String,
}

fn default_status_label() -> String {
    "Approved".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            approval_pattern: DEFAULT_APPROVAL_PATTERN.to_string(),
            status_label: default_status_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub sheet: String,
    pub header: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            sheet: "Data Validation".to_string(),
            header: "Approver".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    pub layout: LayoutConfig,
    pub policy: PolicyConfig,
    pub reference: ReferenceConfig,
}

impl LedgerConfig {
    pub fn store_layout(&self) -> StoreLayout {
        StoreLayout {
            data_start_row: self.layout.data_start_row,
            reference_sheet: self.reference.sheet.clone(),
            reference_header: self.reference.header.clone(),
        }
    }

    pub fn approval_policy(&self) -> Result<ApprovalPolicy> {
        ApprovalPolicy::new(&self.policy.approval_pattern)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLedgerConfig {
    layout: Option<LayoutConfig>,
    policy: Option<PolicyConfig>,
    reference: Option<ReferenceConfig>,
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &LedgerConfig) -> Result<()> {
    if cfg.layout.data_start_row == 0 {
        return Err(anyhow!("invalid data start row: must be >= 1"));
    }
    if cfg.policy.status_label.trim().is_empty() {
        return Err(anyhow!("invalid status label: cannot be empty"));
    }
    if cfg.reference.sheet.trim().is_empty() {
        return Err(anyhow!("invalid reference sheet: cannot be empty"));
    }
    if cfg.reference.header.trim().is_empty() {
        return Err(anyhow!("invalid reference header: cannot be empty"));
    }
    cfg.approval_policy()?;
    Ok(())
}

fn merge_toml(base: &mut LedgerConfig, raw: &str, path: &Path) -> Result<()> {
    let parsed: PartialLedgerConfig = toml::from_str(raw)
        .map_err(|err| anyhow!("failed to parse timeledger config {}: {err}", path.display()))?;
    if let Some(layout) = parsed.layout {
        base.layout = layout;
    }
    if let Some(policy) = parsed.policy {
        base.policy = policy;
    }
    if let Some(reference) = parsed.reference {
        base.reference = reference;
    }
    Ok(())
}

fn merge_file_config(base: &mut LedgerConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let raw = fs::read_to_string(path)?;
    merge_toml(base, &raw, path)
}

pub fn load_config(paths: &LedgerPaths) -> Result<LedgerConfig> {
    let mut cfg = LedgerConfig::default();
    merge_file_config(&mut cfg, &paths.config_file)?;

    cfg.layout.data_start_row = env_or_usize("TIMELEDGER_DATA_START_ROW", cfg.layout.data_start_row);
    cfg.policy.approval_pattern =
        env_or_string("TIMELEDGER_APPROVAL_PATTERN", &cfg.policy.approval_pattern);
    cfg.policy.status_label = env_or_string("TIMELEDGER_STATUS_LABEL", &cfg.policy.status_label);
    cfg.reference.sheet = env_or_string("TIMELEDGER_REFERENCE_SHEET", &cfg.reference.sheet);
    cfg.reference.header = env_or_string("TIMELEDGER_REFERENCE_HEADER", &cfg.reference.header);

    validate(&cfg)?;
    Ok(cfg)
}
