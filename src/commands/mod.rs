pub mod duplicates;
pub mod init;
pub mod reconcile;
pub mod status;

use crate::error::LedgerError;
use crate::ledger::audit;
use crate::ledger::duplicates::DuplicateSet;
use crate::ledger::paths::LedgerPaths;
use crate::ledger::store::{JsonLedgerStore, StoreLayout};
use crate::ledger::warn::{self, WarnEvent};
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

pub fn tagged(err: &LedgerError) -> String {
    format!("[{}] {err}", err.code().as_str())
}

/// Warn, audit, and turn a ledger-level failure into the command's error.
pub fn abort(paths: &LedgerPaths, stage: &str, err: LedgerError) -> anyhow::Error {
    let path = err.path().display().to_string();
    warn::emit(WarnEvent {
        code: err.code().as_str(),
        stage,
        source: &path,
        reason: &err.to_string(),
    });
    if let Err(audit_err) = audit::append_event(paths, stage, "failed", &tagged(&err)) {
        eprintln!("timeledger: audit log unavailable: {audit_err:#}");
    }
    anyhow!(tagged(&err))
}

pub fn open_ledger(
    paths: &LedgerPaths,
    stage: &str,
    ledger: &Path,
    layout: StoreLayout,
) -> Result<JsonLedgerStore> {
    JsonLedgerStore::open(ledger, layout).map_err(|err| abort(paths, stage, err))
}

/// One line per duplicate, in sheet row numbers.
pub fn duplicate_lines(duplicates: &DuplicateSet, data_start_row: usize) -> Vec<String> {
    duplicates
        .entries()
        .iter()
        .map(|d| {
            format!(
                "row {} is a duplicate of row {}",
                d.position + data_start_row,
                d.canonical + data_start_row
            )
        })
        .collect()
}
