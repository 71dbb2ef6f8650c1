use crate::error::LedgerError;
use crate::ledger::field::{CellValue, Field, Record, format_date};
use crate::ledger::util::is_lock_contended;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The ledger the engine reads existing rows from and writes results to.
/// Every write replaces the whole data region of a sheet.
pub trait LedgerStore {
    /// Create `sheet` if it does not exist yet. Returns true when created.
    fn ensure_sheet(&mut self, sheet: &str) -> Result<bool, LedgerError>;
    fn read_existing_records(&self, sheet: &str) -> Result<Vec<Record>, LedgerError>;
    /// Replace every row from the data start row down with `records`.
    fn write_records(&mut self, sheet: &str, records: &[Record]) -> Result<(), LedgerError>;
    /// Full names for initials lookup, or `None` when the ledger has no
    /// reference list.
    fn reference_names(&self) -> Result<Option<Vec<String>>, LedgerError>;
    /// 1-based sheet row of the first record.
    fn data_start_row(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub data_start_row: usize,
    pub reference_sheet: String,
    pub reference_header: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            data_start_row: 4,
            reference_sheet: "Data Validation".to_string(),
            reference_header: "Approver".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<Field>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workbook {
    pub schema_version: u32,
    pub sheets: Vec<Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            schema_version: 1,
            sheets: Vec::new(),
        }
    }
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// An otherwise empty workbook whose reference sheet lists `names` under
    /// the configured header.
    pub fn with_reference(layout: &StoreLayout, names: &[String]) -> Self {
        let mut rows = vec![vec![Field::text(layout.reference_header.as_str())]];
        rows.extend(names.iter().map(|name| vec![Field::text(name.as_str())]));
        Self {
            sheets: vec![Sheet {
                name: layout.reference_sheet.clone(),
                rows,
            }],
            ..Self::default()
        }
    }
}

fn normalize_date(mut record: Record) -> Record {
    if let Some(CellValue::Date(date)) = record.date.value {
        record.date.value = Some(CellValue::Text(format_date(date)));
    }
    record
}

fn missing_sheet(origin: &Path, sheet: &str) -> LedgerError {
    LedgerError::unreadable(origin, format!("sheet `{sheet}` does not exist"))
}

/// In-memory ledger over a [`Workbook`].
#[derive(Debug, Clone, Default)]
pub struct WorkbookLedger {
    origin: PathBuf,
    pub workbook: Workbook,
    pub layout: StoreLayout,
}

impl WorkbookLedger {
    pub fn new(origin: impl Into<PathBuf>, workbook: Workbook, layout: StoreLayout) -> Self {
        Self {
            origin: origin.into(),
            workbook,
            layout,
        }
    }

    fn header_rows(&self) -> usize {
        self.layout.data_start_row.saturating_sub(1)
    }
}

impl LedgerStore for WorkbookLedger {
    fn ensure_sheet(&mut self, sheet: &str) -> Result<bool, LedgerError> {
        if self.workbook.sheet(sheet).is_some() {
            return Ok(false);
        }
        self.workbook.sheets.push(Sheet {
            name: sheet.to_string(),
            rows: Vec::new(),
        });
        Ok(true)
    }

    fn read_existing_records(&self, sheet: &str) -> Result<Vec<Record>, LedgerError> {
        let found = self
            .workbook
            .sheet(sheet)
            .ok_or_else(|| missing_sheet(&self.origin, sheet))?;
        Ok(found
            .rows
            .iter()
            .skip(self.header_rows())
            .map(|row| normalize_date(Record::from_cells(row.clone())))
            .collect())
    }

    fn write_records(&mut self, sheet: &str, records: &[Record]) -> Result<(), LedgerError> {
        let header_rows = self.header_rows();
        let origin = self.origin.clone();
        let target = self
            .workbook
            .sheet_mut(sheet)
            .ok_or_else(|| missing_sheet(&origin, sheet))?;
        target.rows.truncate(header_rows);
        target.rows.resize_with(header_rows, Vec::new);
        target.rows.extend(records.iter().map(Record::to_cells));
        Ok(())
    }

    fn reference_names(&self) -> Result<Option<Vec<String>>, LedgerError> {
        let Some(sheet) = self.workbook.sheet(&self.layout.reference_sheet) else {
            return Ok(None);
        };
        let Some(header) = sheet.rows.first() else {
            return Ok(None);
        };
        let wanted = CellValue::text(self.layout.reference_header.as_str());
        let Some(column) = header
            .iter()
            .position(|cell| cell.value.as_ref() == Some(&wanted))
        else {
            return Ok(None);
        };

        let names: Vec<String> = sheet
            .rows
            .iter()
            .skip(1)
            .map_while(|row| row.get(column).and_then(|cell| cell.value.as_ref()))
            .map(ToString::to_string)
            .collect();
        Ok(Some(names))
    }

    fn data_start_row(&self) -> usize {
        self.layout.data_start_row
    }
}

/// A JSON workbook on disk, held under an exclusive lock for as long as the
/// store is alive. Another process (or handle) holding the file makes
/// [`JsonLedgerStore::open`] fail with `LockedResource`.
#[derive(Debug)]
pub struct JsonLedgerStore {
    path: PathBuf,
    file: File,
    ledger: WorkbookLedger,
}

fn read_workbook(path: &Path, file: &mut File) -> Result<Workbook, LedgerError> {
    let mut raw = String::new();
    file.read_to_string(&mut raw)
        .map_err(|err| LedgerError::from_io(path, &err))?;
    if raw.trim().is_empty() {
        return Ok(Workbook::default());
    }
    serde_json::from_str(&raw)
        .map_err(|err| LedgerError::unreadable(path, format!("invalid ledger workbook: {err}")))
}

impl JsonLedgerStore {
    pub fn open(path: &Path, layout: StoreLayout) -> Result<Self, LedgerError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| LedgerError::from_io(path, &err))?;
        if let Err(err) = FileExt::try_lock_exclusive(&file) {
            if is_lock_contended(&err) {
                return Err(LedgerError::locked(path));
            }
            return Err(LedgerError::from_io(path, &err));
        }

        let workbook = read_workbook(path, &mut file)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            ledger: WorkbookLedger::new(path, workbook, layout),
        })
    }

    /// Write `workbook` to a new file. Fails if the file already exists.
    pub fn create(path: &Path, workbook: &Workbook) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| LedgerError::from_io(path, &err))?;
        let data = serde_json::to_string_pretty(workbook)
            .map_err(|err| LedgerError::unknown(path, err.to_string()))?;
        file.write_all(format!("{data}\n").as_bytes())
            .map_err(|err| LedgerError::from_io(path, &err))
    }

    fn persist(&mut self) -> Result<(), LedgerError> {
        let data = serde_json::to_string_pretty(&self.ledger.workbook)
            .map_err(|err| LedgerError::unknown(&self.path, err.to_string()))?;
        let io_err = |err: std::io::Error| LedgerError::from_io(&self.path, &err);
        self.file.set_len(0).map_err(io_err)?;
        self.file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        self.file
            .write_all(format!("{data}\n").as_bytes())
            .map_err(io_err)?;
        self.file.flush().map_err(io_err)
    }
}

impl LedgerStore for JsonLedgerStore {
    fn ensure_sheet(&mut self, sheet: &str) -> Result<bool, LedgerError> {
        let created = self.ledger.ensure_sheet(sheet)?;
        if created {
            self.persist()?;
        }
        Ok(created)
    }

    fn read_existing_records(&self, sheet: &str) -> Result<Vec<Record>, LedgerError> {
        self.ledger.read_existing_records(sheet)
    }

    fn write_records(&mut self, sheet: &str, records: &[Record]) -> Result<(), LedgerError> {
        self.ledger.write_records(sheet, records)?;
        self.persist()
    }

    fn reference_names(&self) -> Result<Option<Vec<String>>, LedgerError> {
        self.ledger.reference_names()
    }

    fn data_start_row(&self) -> usize {
        self.ledger.data_start_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::field::Annotation;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn row(values: &[&str]) -> Vec<Field> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Field::empty()
                } else {
                    Field::text(*v)
                }
            })
            .collect()
    }

    fn ledger_with(rows: Vec<Vec<Field>>) -> WorkbookLedger {
        let workbook = Workbook {
            schema_version: 1,
            sheets: vec![Sheet {
                name: "March 2024".to_string(),
                rows,
            }],
        };
        WorkbookLedger::new("ledger.json", workbook, StoreLayout::default())
    }

    #[test]
    fn records_start_at_data_row_and_dates_become_text() {
        let mut data = row(&["", "Ann", "", "", "", "note"]);
        data[4] = Field::new(CellValue::Date(
            NaiveDate::from_ymd_opt(2024, 3, 4).expect("date"),
        ));
        data[5].annotation = Some(Annotation::Styled("fill:FFFF0000".into()));
        let ledger = ledger_with(vec![row(&["title"]), row(&[]), row(&["", "Name"]), data]);

        let records = ledger.read_existing_records("March 2024").expect("read");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.value, Some(CellValue::text("Ann")));
        assert_eq!(records[0].date.value, Some(CellValue::text("03/04/2024")));
        assert_eq!(
            records[0].note.annotation,
            Some(Annotation::Styled("fill:FFFF0000".into()))
        );
    }

    #[test]
    fn write_replaces_data_rows_and_keeps_header() {
        let mut ledger = ledger_with(vec![
            row(&["title"]),
            row(&[]),
            row(&["", "Name"]),
            row(&["", "Old"]),
            row(&["", "Older"]),
        ]);
        let fresh = Record::from_cells(row(&["", "New"]));
        ledger.write_records("March 2024", &[fresh]).expect("write");

        let sheet = ledger.workbook.sheet("March 2024").expect("sheet");
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[0], row(&["title"]));
        let records = ledger.read_existing_records("March 2024").expect("read");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.value, Some(CellValue::text("New")));
    }

    #[test]
    fn write_pads_missing_header_rows() {
        let mut ledger = ledger_with(Vec::new());
        ledger
            .write_records("March 2024", &[Record::from_cells(row(&["", "Ann"]))])
            .expect("write");
        let sheet = ledger.workbook.sheet("March 2024").expect("sheet");
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(ledger.read_existing_records("March 2024").expect("read").len(), 1);
    }

    #[test]
    fn ensure_sheet_creates_once() {
        let mut ledger = WorkbookLedger::default();
        assert!(ledger.ensure_sheet("April 2024").expect("ensure"));
        assert!(!ledger.ensure_sheet("April 2024").expect("ensure again"));
        assert!(ledger.read_existing_records("April 2024").expect("read").is_empty());
        assert!(ledger.read_existing_records("May 2024").is_err());
    }

    #[test]
    fn reference_names_read_down_to_first_gap() {
        let mut ledger = ledger_with(Vec::new());
        ledger.workbook.sheets.push(Sheet {
            name: "Data Validation".to_string(),
            rows: vec![
                row(&["Code", "Approver"]),
                row(&["ST", "Ann Brown"]),
                row(&["OT", "Carl Evans"]),
                row(&["DT", ""]),
                row(&["", "Never Read"]),
            ],
        });
        let names = ledger.reference_names().expect("names").expect("present");
        assert_eq!(names, vec!["Ann Brown", "Carl Evans"]);
    }

    #[test]
    fn reference_names_absent_without_sheet_or_header() {
        let mut ledger = ledger_with(Vec::new());
        assert_eq!(ledger.reference_names().expect("names"), None);
        ledger.workbook.sheets.push(Sheet {
            name: "Data Validation".to_string(),
            rows: vec![row(&["Code"])],
        });
        assert_eq!(ledger.reference_names().expect("names"), None);
    }

    #[test]
    fn seeded_reference_sheet_reads_back() {
        let layout = StoreLayout::default();
        let names = vec!["Ann Brown".to_string(), "Carl Eng".to_string()];
        let ledger = WorkbookLedger::new(
            "ledger.json",
            Workbook::with_reference(&layout, &names),
            layout,
        );
        assert_eq!(ledger.reference_names().expect("names"), Some(names));
    }

    #[test]
    fn json_store_persists_and_locks() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("ledger.json");
        JsonLedgerStore::create(&path, &Workbook::default()).expect("create");
        assert!(JsonLedgerStore::create(&path, &Workbook::default()).is_err());

        {
            let mut store = JsonLedgerStore::open(&path, StoreLayout::default()).expect("open");
            assert!(store.ensure_sheet("March 2024").expect("ensure"));

            let second = JsonLedgerStore::open(&path, StoreLayout::default())
                .expect_err("second open must fail");
            assert_eq!(second.code(), crate::error::ErrorCode::OpenFile);

            store
                .write_records("March 2024", &[Record::from_cells(row(&["", "Ann"]))])
                .expect("write");
        }

        let store = JsonLedgerStore::open(&path, StoreLayout::default()).expect("reopen");
        assert_eq!(store.ledger.workbook.sheets.len(), 1);
        assert!(store.ledger.workbook.sheet("March 2024").is_some());
        let records = store.read_existing_records("March 2024").expect("read");
        assert_eq!(records[0].name.value, Some(CellValue::text("Ann")));
    }

    #[test]
    fn corrupt_workbook_is_unreadable_and_empty_file_is_blank() {
        let tmp = tempdir().expect("tempdir");
        let corrupt = tmp.path().join("corrupt.json");
        fs::write(&corrupt, "{not json").expect("write");
        let err = JsonLedgerStore::open(&corrupt, StoreLayout::default()).expect_err("corrupt");
        assert_eq!(err.code(), crate::error::ErrorCode::Unreadable);

        let empty = tmp.path().join("empty.json");
        fs::write(&empty, "").expect("write");
        let store = JsonLedgerStore::open(&empty, StoreLayout::default()).expect("open empty");
        assert!(store.ledger.workbook.sheets.is_empty());
    }
}
