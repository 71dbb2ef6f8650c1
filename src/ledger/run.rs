use crate::error::LedgerError;
use crate::ledger::admission::{ApprovalPolicy, approver_initials_from_source, sheet_name_from_source};
use crate::ledger::approver;
use crate::ledger::assemble::assemble_timesheet;
use crate::ledger::duplicates::{self, DuplicateSet, KeyWindow};
use crate::ledger::field::Record;
use crate::ledger::organize;
use crate::ledger::progress::{Phase, ProgressSink};
use crate::ledger::store::LedgerStore;
use crate::ledger::timesheet::{self, SourceGrid};
use std::path::{Path, PathBuf};

/// Everything a run needs to know, fixed before the first phase starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub ledger_path: PathBuf,
    pub sheet: String,
    pub status_label: String,
    pub policy: ApprovalPolicy,
    pub remove_duplicates: bool,
}

impl RunContext {
    /// The sheet named on the command line, or the month of the first source
    /// whose file name carries a date.
    pub fn resolve_sheet(explicit: Option<&str>, sources: &[PathBuf]) -> Option<String> {
        if let Some(name) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            return Some(name.to_string());
        }
        sources.iter().find_map(|p| sheet_name_from_source(p))
    }
}

#[derive(Debug)]
pub struct SourceFailure {
    pub path: PathBuf,
    pub error: LedgerError,
}

#[derive(Debug)]
pub struct LedgerSnapshot {
    pub sheet_created: bool,
    pub records: Vec<Record>,
    pub reference: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SourceBatch {
    pub records: Vec<Record>,
    pub processed: usize,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub sheet: String,
    pub sheet_created: bool,
    pub existing_records: usize,
    pub new_records: usize,
    pub written_records: usize,
    pub sources_processed: usize,
    pub source_failures: Vec<SourceFailure>,
    pub missing_data: bool,
    pub duplicates: DuplicateSet,
    pub duplicates_removed: usize,
    /// Set when removal was requested but the ledger refused the rewrite.
    /// `duplicates` still lists every detected row so the removal can be
    /// retried.
    pub removal_error: Option<LedgerError>,
}

pub fn read_ledger(
    ctx: &RunContext,
    store: &mut dyn LedgerStore,
) -> Result<LedgerSnapshot, LedgerError> {
    let sheet_created = store.ensure_sheet(&ctx.sheet)?;
    let records = store.read_existing_records(&ctx.sheet)?;
    let reference = store.reference_names()?.unwrap_or_default();
    Ok(LedgerSnapshot {
        sheet_created,
        records,
        reference,
    })
}

pub fn process_source<G, F>(
    ctx: &RunContext,
    path: &Path,
    reference: &[String],
    open: &F,
) -> Result<Vec<Record>, LedgerError>
where
    G: SourceGrid,
    F: Fn(&Path) -> Result<G, LedgerError>,
{
    ctx.policy.admit(path)?;
    let grid = open(path)?;
    let parsed = timesheet::parse(&grid)?;
    let approver = approver::resolve(&approver_initials_from_source(path), reference);
    Ok(assemble_timesheet(&parsed, &approver, &ctx.status_label))
}

/// Parse every source in order. A failing source is recorded and skipped;
/// it never stops the remaining ones.
pub fn collect_sources<G, F>(
    ctx: &RunContext,
    sources: &[PathBuf],
    reference: &[String],
    open: &F,
    progress: &mut dyn ProgressSink,
) -> SourceBatch
where
    G: SourceGrid,
    F: Fn(&Path) -> Result<G, LedgerError>,
{
    let mut batch = SourceBatch::default();
    for (index, path) in sources.iter().enumerate() {
        match process_source(ctx, path, reference, open) {
            Ok(records) => {
                batch.processed += 1;
                batch.records.extend(records);
            }
            Err(error) => batch.failures.push(SourceFailure {
                path: path.clone(),
                error,
            }),
        }
        progress.source(index, sources.len(), path);
    }
    batch
}

/// Merge, filter, and sort in one pass.
pub fn organize_records(
    existing: Vec<Record>,
    new_records: Vec<Record>,
    progress: &mut dyn ProgressSink,
) -> Vec<Record> {
    progress.phase(Phase::Merge);
    let combined = organize::merge(existing, new_records);
    progress.phase(Phase::Filter);
    let mut kept = organize::filter(combined);
    progress.phase(Phase::Sort);
    organize::sort(&mut kept);
    kept
}

pub fn reconcile<G, F>(
    ctx: &RunContext,
    store: &mut dyn LedgerStore,
    sources: &[PathBuf],
    open: F,
    progress: &mut dyn ProgressSink,
) -> Result<RunOutcome, LedgerError>
where
    G: SourceGrid,
    F: Fn(&Path) -> Result<G, LedgerError>,
{
    progress.phase(Phase::ReadLedger);
    let snapshot = read_ledger(ctx, store)?;

    progress.phase(Phase::ParseSources);
    let batch = collect_sources(ctx, sources, &snapshot.reference, &open, progress);
    let missing_data = batch.records.iter().any(Record::has_flagged_field);
    let existing_records = snapshot.records.len();
    let new_records = batch.records.len();

    let organized = organize_records(snapshot.records, batch.records, progress);

    progress.phase(Phase::Write);
    store.write_records(&ctx.sheet, &organized)?;

    progress.phase(Phase::DetectDuplicates);
    let written = store.read_existing_records(&ctx.sheet)?;
    let found = duplicates::detect(&written, &KeyWindow::LEDGER);

    let mut duplicates_removed = 0;
    let mut removal_error = None;
    if ctx.remove_duplicates && !found.is_empty() {
        progress.phase(Phase::RemoveDuplicates);
        match duplicates::remove_from_store(store, &ctx.sheet, &found) {
            Ok(removed) => duplicates_removed = removed,
            Err(err) => removal_error = Some(err),
        }
    }

    Ok(RunOutcome {
        sheet: ctx.sheet.clone(),
        sheet_created: snapshot.sheet_created,
        existing_records,
        new_records,
        written_records: written.len(),
        sources_processed: batch.processed,
        source_failures: batch.failures,
        missing_data,
        duplicates: found,
        duplicates_removed,
        removal_error,
    })
}
