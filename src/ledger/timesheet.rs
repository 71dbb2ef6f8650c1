use crate::error::LedgerError;
use crate::ledger::field::CellValue;
use chrono::NaiveDate;
use std::path::Path;

/// Header row holding the employee name and the week start date.
pub const HEADER_ROW: usize = 3;
pub const EMPLOYEE_COL: usize = 3;
pub const WEEK_START_COL: usize = 7;
/// First task line of a timesheet.
pub const SCAN_START_ROW: usize = 13;
pub const DESCRIPTION_COL: usize = 1;
pub const NOTE_COL: usize = 2;
pub const PAY_TYPE_COL: usize = 4;
/// Sunday hours; Monday through Saturday follow in the next six columns.
pub const FIRST_HOURS_COL: usize = 5;
pub const DAYS_PER_WEEK: usize = 7;
/// Consecutive lines without a description that end the scan. Anything
/// below such a run is never read.
pub const BLANK_RUN_LIMIT: usize = 3;

/// A positional, 1-based view of one source document.
pub trait SourceGrid {
    fn origin(&self) -> &Path;
    fn cell(&self, row: usize, col: usize) -> Option<CellValue>;
    fn max_row(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetEntry {
    pub description: CellValue,
    pub note: Option<CellValue>,
    pub pay_type: Option<CellValue>,
    /// Sunday through Saturday.
    pub hours: [CellValue; DAYS_PER_WEEK],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTimesheet {
    pub week_start: NaiveDate,
    pub employee: Option<CellValue>,
    pub entries: Vec<TimesheetEntry>,
}

impl ParsedTimesheet {
    pub fn dates(&self) -> [NaiveDate; DAYS_PER_WEEK] {
        std::array::from_fn(|offset| self.week_start + chrono::Days::new(offset as u64))
    }
}

fn read_week_start(grid: &dyn SourceGrid) -> Result<NaiveDate, LedgerError> {
    let cell = grid.cell(HEADER_ROW, WEEK_START_COL);
    cell.as_ref().and_then(CellValue::as_date).ok_or_else(|| {
        LedgerError::unreadable(
            grid.origin(),
            format!(
                "week start date missing at row {HEADER_ROW} column {WEEK_START_COL} (found {})",
                cell.as_ref()
                    .map(CellValue::to_string)
                    .unwrap_or_else(|| "nothing".to_string())
            ),
        )
    })
}

fn read_line(grid: &dyn SourceGrid, row: usize, description: CellValue) -> TimesheetEntry {
    TimesheetEntry {
        description,
        note: grid.cell(row, NOTE_COL),
        pay_type: grid.cell(row, PAY_TYPE_COL),
        hours: std::array::from_fn(|day| {
            grid.cell(row, FIRST_HOURS_COL + day)
                .unwrap_or(CellValue::Number(0.0))
        }),
    }
}

pub fn parse_entries(grid: &dyn SourceGrid) -> Vec<TimesheetEntry> {
    let mut entries = Vec::new();
    let mut blank_run = 0usize;
    for row in SCAN_START_ROW..=grid.max_row() {
        let Some(description) = grid.cell(row, DESCRIPTION_COL) else {
            blank_run += 1;
            if blank_run >= BLANK_RUN_LIMIT {
                break;
            }
            continue;
        };
        blank_run = 0;
        entries.push(read_line(grid, row, description));
    }
    entries
}

pub fn parse(grid: &dyn SourceGrid) -> Result<ParsedTimesheet, LedgerError> {
    let week_start = read_week_start(grid)?;
    Ok(ParsedTimesheet {
        week_start,
        employee: grid.cell(HEADER_ROW, EMPLOYEE_COL),
        entries: parse_entries(grid),
    })
}
