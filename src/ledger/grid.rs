use crate::error::LedgerError;
use crate::ledger::field::{CellValue, parse_date};
use crate::ledger::timesheet::SourceGrid;
use crate::ledger::util::is_lock_contended;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A timesheet exported as CSV, addressed the way the spreadsheet was:
/// row 1 is the first CSV line, column 1 the first field.
#[derive(Debug, Clone)]
pub struct CsvGrid {
    path: PathBuf,
    rows: Vec<Vec<Option<CellValue>>>,
}

fn looks_numeric(raw: &str) -> bool {
    !raw.is_empty()
        && raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
}

pub fn parse_cell(raw: &str) -> Option<CellValue> {
    if raw.is_empty() {
        return None;
    }
    let trimmed = raw.trim();
    if looks_numeric(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            return Some(CellValue::Number(n));
        }
    }
    if trimmed.contains('/') || trimmed.len() == 10 {
        if let Some(date) = parse_date(trimmed) {
            return Some(CellValue::Date(date));
        }
    }
    Some(CellValue::Text(raw.to_string()))
}

impl CsvGrid {
    /// Read the whole grid under a shared lock. A writer holding the file
    /// exclusively makes this fail with `LockedResource`.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|err| LedgerError::from_io(path, &err))?;
        if let Err(err) = FileExt::try_lock_shared(&file) {
            if is_lock_contended(&err) {
                return Err(LedgerError::locked(path));
            }
            return Err(LedgerError::from_io(path, &err));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&file);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| LedgerError::unreadable(path, err.to_string()))?;
            rows.push(record.iter().map(parse_cell).collect());
        }
        FileExt::unlock(&file).map_err(|err| LedgerError::from_io(path, &err))?;

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }
}

impl SourceGrid for CsvGrid {
    fn origin(&self) -> &Path {
        &self.path
    }

    fn cell(&self, row: usize, col: usize) -> Option<CellValue> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows.get(row - 1)?.get(col - 1)?.clone()
    }

    fn max_row(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    path: PathBuf,
    cells: std::collections::BTreeMap<(usize, usize), CellValue>,
}

#[cfg(test)]
impl MemoryGrid {
    pub fn new(name: &str) -> Self {
        Self {
            path: PathBuf::from(name),
            cells: Default::default(),
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        self.cells.insert((row, col), value);
    }
}

#[cfg(test)]
impl SourceGrid for MemoryGrid {
    fn origin(&self) -> &Path {
        &self.path
    }

    fn cell(&self, row: usize, col: usize) -> Option<CellValue> {
        self.cells.get(&(row, col)).cloned()
    }

    fn max_row(&self) -> usize {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cells_are_typed_on_read() {
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("7.5"), Some(CellValue::Number(7.5)));
        assert_eq!(parse_cell("2C"), Some(CellValue::text("2C")));
        assert_eq!(parse_cell("   "), Some(CellValue::text("   ")));
        assert_eq!(parse_cell("4-Splicing"), Some(CellValue::text("4-Splicing")));
        assert_eq!(
            parse_cell("03/03/2024"),
            Some(CellValue::Date(
                NaiveDate::from_ymd_opt(2024, 3, 3).expect("date")
            ))
        );
        assert_eq!(parse_cell("nan"), Some(CellValue::text("nan")));
    }

    #[test]
    fn csv_rows_are_addressed_from_one() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("sheet.csv");
        fs::write(&path, "a,b\n,,c,,\n").expect("write csv");

        let grid = CsvGrid::open(&path).expect("open");
        assert_eq!(grid.max_row(), 2);
        assert_eq!(grid.cell(1, 1), Some(CellValue::text("a")));
        assert_eq!(grid.cell(2, 1), None);
        assert_eq!(grid.cell(2, 3), Some(CellValue::text("c")));
        assert_eq!(grid.cell(9, 9), None);
        assert_eq!(grid.cell(0, 1), None);
    }

    #[test]
    fn exclusively_held_source_is_locked() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("sheet.csv");
        fs::write(&path, "a\n").expect("write csv");

        let holder = File::open(&path).expect("open holder");
        FileExt::lock_exclusive(&holder).expect("lock");
        let err = CsvGrid::open(&path).expect_err("locked");
        assert_eq!(err.code(), ErrorCode::OpenFile);
        FileExt::unlock(&holder).expect("unlock");

        assert!(CsvGrid::open(&path).is_ok());
    }

    #[test]
    fn missing_source_is_reported() {
        let tmp = tempdir().expect("tempdir");
        let err = CsvGrid::open(&tmp.path().join("nope.csv")).expect_err("missing");
        assert_eq!(err.code(), ErrorCode::Unknown);
    }

    #[test]
    fn invalid_utf8_source_is_unreadable() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("sheet.csv");
        fs::write(&path, b"ok,\xff\xfe\n").expect("write csv");

        let err = CsvGrid::open(&path).expect_err("bad bytes");
        assert_eq!(err.code(), ErrorCode::Unreadable);
    }
}
