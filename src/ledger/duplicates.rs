use crate::error::LedgerError;
use crate::ledger::field::{CellValue, Record};
use crate::ledger::store::LedgerStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Columns (0-based, end exclusive) whose values make up the duplicate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWindow(pub Range<usize>);

impl KeyWindow {
    /// Name through hours (columns B..K); the lead column and the week slots
    /// do not take part.
    pub const LEDGER: KeyWindow = KeyWindow(1..11);
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompositeKey(Vec<Option<CellValue>>);

impl CompositeKey {
    pub fn of(record: &Record, window: &KeyWindow) -> Self {
        Self(
            window
                .0
                .clone()
                .map(|column| record.value_at(column).cloned())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duplicate {
    pub position: usize,
    pub canonical: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    entries: Vec<Duplicate>,
}

impl DuplicateSet {
    pub fn entries(&self) -> &[Duplicate] {
        &self.entries
    }

    pub fn positions(&self) -> Vec<usize> {
        self.entries.iter().map(|d| d.position).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flag every record whose key was already seen at a lower position.
pub fn detect(records: &[Record], window: &KeyWindow) -> DuplicateSet {
    let mut first_seen: BTreeMap<CompositeKey, usize> = BTreeMap::new();
    let mut entries = Vec::new();
    for (position, record) in records.iter().enumerate() {
        let key = CompositeKey::of(record, window);
        match first_seen.get(&key) {
            Some(&canonical) => entries.push(Duplicate {
                position,
                canonical,
            }),
            None => {
                first_seen.insert(key, position);
            }
        }
    }
    DuplicateSet { entries }
}

/// Delete the flagged positions, highest first, and return what is left.
/// Positions past the end are ignored.
pub fn remove(records: Vec<Record>, duplicates: &DuplicateSet) -> Vec<Record> {
    let mut positions = duplicates.positions();
    positions.sort_unstable_by(|a, b| b.cmp(a));
    positions.dedup();

    let mut records = records;
    for position in positions {
        if position < records.len() {
            records.remove(position);
        }
    }
    records
}

/// Re-read `sheet`, drop the flagged rows, and write the rest back.
/// Returns how many rows went away.
pub fn remove_from_store(
    store: &mut dyn LedgerStore,
    sheet: &str,
    duplicates: &DuplicateSet,
) -> Result<usize, LedgerError> {
    let records = store.read_existing_records(sheet)?;
    let before = records.len();
    let kept = remove(records, duplicates);
    let removed = before - kept.len();
    store.write_records(sheet, &kept)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::field::{Annotation, Field};

    fn record(name: &str, note: &str, lead: &str, slot: Option<f64>) -> Record {
        Record {
            lead: Field::text(lead),
            name: Field::text(name),
            date: Field::text("03/04/2024"),
            note: Field::text(note),
            hours: Field::new(CellValue::Number(5.0)),
            week_slots: slot
                .map(|h| vec![Field::empty(), Field::new(CellValue::Number(h))])
                .unwrap_or_default(),
            ..Record::default()
        }
    }

    #[test]
    fn repeats_in_key_window_reference_first_occurrence() {
        let mut second = record("Ann", "x", "lead-b", Some(5.0));
        second.name.annotation = Some(Annotation::NeedsAttention);
        let records = vec![
            record("Ann", "x", "lead-a", None),
            record("Bob", "y", "", None),
            second,
            record("Ann", "x", "lead-c", Some(9.0)),
        ];

        let dupes = detect(&records, &KeyWindow::LEDGER);
        assert_eq!(
            dupes.entries(),
            &[
                Duplicate {
                    position: 2,
                    canonical: 0
                },
                Duplicate {
                    position: 3,
                    canonical: 0
                },
            ]
        );

        let kept = remove(records, &dupes);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].lead.value, Some(CellValue::text("lead-a")));
        assert_eq!(kept[1].name.value, Some(CellValue::text("Bob")));
    }

    #[test]
    fn three_identical_keys_leave_one_survivor_in_place() {
        let records = vec![
            record("Zed", "z", "", None),
            record("Ann", "x", "first", None),
            record("Ann", "x", "second", Some(1.0)),
            record("Ann", "x", "third", Some(2.0)),
        ];
        let dupes = detect(&records, &KeyWindow::LEDGER);
        assert_eq!(dupes.len(), 2);
        assert!(dupes.entries().iter().all(|d| d.canonical == 1));

        let kept = remove(records, &dupes);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].lead.value, Some(CellValue::text("first")));
    }

    #[test]
    fn differing_key_values_are_not_duplicates() {
        let records = vec![record("Ann", "x", "", None), record("Ann", "y", "", None)];
        assert!(detect(&records, &KeyWindow::LEDGER).is_empty());
    }

    #[test]
    fn absent_and_empty_values_differ() {
        let mut absent = record("Ann", "x", "", None);
        absent.note = Field::empty();
        let mut empty = record("Ann", "x", "", None);
        empty.note = Field::text("");
        assert!(detect(&[absent, empty], &KeyWindow::LEDGER).is_empty());
    }

    #[test]
    fn removal_from_store_rewrites_the_sheet() {
        use crate::ledger::store::{StoreLayout, Workbook, WorkbookLedger};

        let mut store =
            WorkbookLedger::new("/ledger.json", Workbook::default(), StoreLayout::default());
        store.ensure_sheet("March 2024").expect("sheet");
        let records = vec![
            record("Ann", "x", "", None),
            record("Ann", "x", "", None),
            record("Bob", "y", "", None),
        ];
        store.write_records("March 2024", &records).expect("write");

        let dupes = detect(&records, &KeyWindow::LEDGER);
        let removed = remove_from_store(&mut store, "March 2024", &dupes).expect("remove");
        assert_eq!(removed, 1);
        let left = store.read_existing_records("March 2024").expect("read");
        assert_eq!(left.len(), 2);
        assert!(detect(&left, &KeyWindow::LEDGER).is_empty());
    }

    #[test]
    fn remove_without_duplicates_is_identity() {
        let records = vec![record("Ann", "x", "", None), record("Bob", "y", "", None)];
        assert_eq!(remove(records.clone(), &DuplicateSet::default()), records);
    }
}
