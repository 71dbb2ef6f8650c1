use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, abort};
use crate::ledger::audit;
use crate::ledger::config::load_config;
use crate::ledger::paths::resolve_paths;
use crate::ledger::store::{JsonLedgerStore, Workbook};

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub ledger: PathBuf,
    pub approvers: Vec<String>,
}

pub fn run(opts: &InitOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let layout = cfg.store_layout();

    let workbook = if opts.approvers.is_empty() {
        Workbook::default()
    } else {
        Workbook::with_reference(&layout, &opts.approvers)
    };
    JsonLedgerStore::create(&opts.ledger, &workbook)
        .map_err(|err| abort(&paths, "init", err))?;

    let mut report = CommandReport::new("init");
    report.detail(format!("ledger={}", opts.ledger.display()));
    if opts.approvers.is_empty() {
        report.detail("no approver reference list; initials stay as written");
    } else {
        report.detail(format!(
            "{} approvers listed on sheet `{}`",
            opts.approvers.len(),
            layout.reference_sheet
        ));
    }
    audit::append_event(
        &paths,
        "init",
        "ok",
        &format!("ledger={}", opts.ledger.display()),
    )?;
    Ok(report)
}
