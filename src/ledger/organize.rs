use crate::ledger::field::{CellValue, Record};

/// Existing ledger rows first, exactly as stored, then the new rows.
pub fn merge(existing: Vec<Record>, new_records: Vec<Record>) -> Vec<Record> {
    let mut combined = existing;
    combined.extend(new_records);
    combined
}

/// Drop rows with no name or no date. Only a missing value counts; empty or
/// whitespace-only text is kept.
pub fn filter(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| r.name.value.is_some() && r.date.value.is_some())
        .collect()
}

fn sort_key(record: &Record) -> (Option<&CellValue>, Option<&CellValue>) {
    (record.name.value.as_ref(), record.date.value.as_ref())
}

/// Stable sort by name, then date. Dates are `MM/DD/YYYY` text here, so the
/// order is lexicographic rather than chronological across years.
pub fn sort(records: &mut [Record]) {
    records.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}
