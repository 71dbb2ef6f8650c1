use anyhow::{Result, anyhow};
use std::path::PathBuf;

use crate::commands::{CommandReport, abort, duplicate_lines, open_ledger, tagged};
use crate::ledger::audit;
use crate::ledger::config::load_config;
use crate::ledger::grid::CsvGrid;
use crate::ledger::paths::resolve_paths;
use crate::ledger::progress::{NoProgress, ProgressSink, StderrProgress};
use crate::ledger::run::{self, RunContext, RunOutcome};
use crate::ledger::store::LedgerStore;
use crate::ledger::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub ledger: PathBuf,
    pub sheet: Option<String>,
    pub remove_duplicates: bool,
    pub sources: Vec<PathBuf>,
    pub quiet: bool,
}

pub fn run(opts: &ReconcileOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;

    let sheet = RunContext::resolve_sheet(opts.sheet.as_deref(), &opts.sources).ok_or_else(|| {
        anyhow!("no source file name carries a MMDDYYYY date; pass --sheet to name the ledger sheet")
    })?;
    let ctx = RunContext {
        ledger_path: opts.ledger.clone(),
        sheet,
        status_label: cfg.policy.status_label.clone(),
        policy: cfg.approval_policy()?,
        remove_duplicates: opts.remove_duplicates,
    };

    let mut progress: Box<dyn ProgressSink> = if opts.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(StderrProgress)
    };
    let mut store = open_ledger(&paths, "reconcile", &ctx.ledger_path, cfg.store_layout())?;
    let outcome = run::reconcile(
        &ctx,
        &mut store,
        &opts.sources,
        CsvGrid::open,
        progress.as_mut(),
    )
    .map_err(|err| abort(&paths, "reconcile", err))?;

    let report = build_report(&ctx, &outcome, store.data_start_row());
    let status = if report.ok { "ok" } else { "degraded" };
    audit::append_event(
        &paths,
        "reconcile",
        status,
        &format!(
            "sheet={} sources={} skipped={} new={} written={} duplicates={} removed={}",
            outcome.sheet,
            outcome.sources_processed,
            outcome.source_failures.len(),
            outcome.new_records,
            outcome.written_records,
            outcome.duplicates.len(),
            outcome.duplicates_removed,
        ),
    )?;
    Ok(report)
}

fn build_report(ctx: &RunContext, outcome: &RunOutcome, data_start_row: usize) -> CommandReport {
    let mut report = CommandReport::new("reconcile");
    report.detail(format!("ledger={}", ctx.ledger_path.display()));
    report.detail(format!("sheet={}", outcome.sheet));
    if outcome.sheet_created {
        report.detail(format!(
            "{} not in the ledger; it has been created",
            outcome.sheet
        ));
    }
    report.detail(format!("sources_processed={}", outcome.sources_processed));
    report.detail(format!("existing_records={}", outcome.existing_records));
    report.detail(format!("new_records={}", outcome.new_records));
    report.detail(format!("written_records={}", outcome.written_records));
    report.detail(if outcome.missing_data {
        "missing data identified"
    } else {
        "no missing data identified"
    });

    for failure in &outcome.source_failures {
        let source = failure.path.display().to_string();
        warn::emit(WarnEvent {
            code: failure.error.code().as_str(),
            stage: "parse-sources",
            source: &source,
            reason: &failure.error.to_string(),
        });
        report.issue(tagged(&failure.error));
    }

    if outcome.duplicates.is_empty() {
        report.detail("no duplicates found");
    } else {
        for line in duplicate_lines(&outcome.duplicates, data_start_row) {
            report.detail(line);
        }
        if let Some(err) = &outcome.removal_error {
            let ledger = err.path().display().to_string();
            warn::emit(WarnEvent {
                code: err.code().as_str(),
                stage: "remove-duplicates",
                source: &ledger,
                reason: &err.to_string(),
            });
            report.issue(format!(
                "{}; duplicate rows kept, retry with `timeledger duplicates --remove`",
                tagged(err)
            ));
        } else if outcome.duplicates_removed > 0 {
            report.detail(format!(
                "removed {} duplicate rows",
                outcome.duplicates_removed
            ));
        } else {
            report.detail(format!(
                "{} duplicate rows kept; rerun with --remove-duplicates or use `timeledger duplicates --remove`",
                outcome.duplicates.len()
            ));
        }
    }
    report
}
