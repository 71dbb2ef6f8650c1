use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, abort, duplicate_lines, open_ledger};
use crate::ledger::audit;
use crate::ledger::config::load_config;
use crate::ledger::duplicates::{self, KeyWindow};
use crate::ledger::paths::resolve_paths;
use crate::ledger::store::LedgerStore;

#[derive(Debug, Clone)]
pub struct DuplicatesOptions {
    pub ledger: PathBuf,
    pub sheet: String,
    pub remove: bool,
}

pub fn run(opts: &DuplicatesOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut store = open_ledger(&paths, "duplicates", &opts.ledger, cfg.store_layout())?;
    let mut report = CommandReport::new("duplicates");
    report.detail(format!("ledger={}", opts.ledger.display()));
    report.detail(format!("sheet={}", opts.sheet));

    let records = store
        .read_existing_records(&opts.sheet)
        .map_err(|err| abort(&paths, "duplicates", err))?;
    let found = duplicates::detect(&records, &KeyWindow::LEDGER);
    report.detail(format!("records={}", records.len()));

    if found.is_empty() {
        report.detail("no duplicates found");
    } else {
        for line in duplicate_lines(&found, store.data_start_row()) {
            report.detail(line);
        }
    }

    let mut removed = 0;
    if opts.remove && !found.is_empty() {
        removed = duplicates::remove_from_store(&mut store, &opts.sheet, &found)
            .map_err(|err| abort(&paths, "duplicates", err))?;
        report.detail(format!("removed {removed} duplicate rows"));
    }

    audit::append_event(
        &paths,
        "duplicates",
        "ok",
        &format!(
            "sheet={} duplicates={} removed={removed}",
            opts.sheet,
            found.len()
        ),
    )?;
    Ok(report)
}
