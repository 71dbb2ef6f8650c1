use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Number of fixed columns (A through K) every record carries.
pub const BASE_COLUMNS: usize = 11;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Number(n) if *n == 0.0)
    }

    /// Non-empty text made only of whitespace. Empty text does not count.
    pub fn is_whitespace_only(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty() && s.chars().all(char::is_whitespace),
            _ => false,
        }
    }

    /// Interpret the value as a calendar date: either a date cell or text in
    /// `MM/DD/YYYY` or ISO form.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => parse_date(s),
            Self::Number(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => f.write_str(&format_date(*d)),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    NeedsAttention,
    /// Styling carried over from an existing ledger cell, kept verbatim.
    Styled(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
}

impl Field {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(value: CellValue) -> Self {
        Self {
            value: Some(value),
            annotation: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(CellValue::Text(value.into()))
    }

    pub fn from_option(value: Option<CellValue>) -> Self {
        Self {
            value,
            annotation: None,
        }
    }

    /// A field for newly assembled data, flagged when the value is missing.
    pub fn checked(value: Option<CellValue>) -> Self {
        let annotation = needs_attention(value.as_ref()).then_some(Annotation::NeedsAttention);
        Self { value, annotation }
    }

    pub fn is_flagged(&self) -> bool {
        self.annotation == Some(Annotation::NeedsAttention)
    }
}

pub fn needs_attention(value: Option<&CellValue>) -> bool {
    match value {
        None => true,
        Some(v) => v.is_whitespace_only(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub lead: Field,
    pub name: Field,
    pub task_short: Field,
    pub task_long: Field,
    pub date: Field,
    pub note: Field,
    pub description: Field,
    pub time_type: Field,
    pub approver: Field,
    pub status: Field,
    pub hours: Field,
    /// Columns L onward. Assembled records hold one slot per week up to the
    /// entry's week, with the hours in the last one.
    pub week_slots: Vec<Field>,
}

impl Record {
    /// Build a record from a positional row, padding short rows with absent
    /// fields and keeping everything past column K as week slots.
    pub fn from_cells(cells: Vec<Field>) -> Self {
        let mut iter = cells.into_iter();
        let mut next = || iter.next().unwrap_or_default();
        let mut record = Record {
            lead: next(),
            name: next(),
            task_short: next(),
            task_long: next(),
            date: next(),
            note: next(),
            description: next(),
            time_type: next(),
            approver: next(),
            status: next(),
            hours: next(),
            week_slots: Vec::new(),
        };
        record.week_slots = iter.collect();
        record
    }

    pub fn to_cells(&self) -> Vec<Field> {
        let mut cells = Vec::with_capacity(self.column_count());
        cells.extend(self.base_fields().into_iter().cloned());
        cells.extend(self.week_slots.iter().cloned());
        cells
    }

    pub fn base_fields(&self) -> [&Field; BASE_COLUMNS] {
        [
            &self.lead,
            &self.name,
            &self.task_short,
            &self.task_long,
            &self.date,
            &self.note,
            &self.description,
            &self.time_type,
            &self.approver,
            &self.status,
            &self.hours,
        ]
    }

    pub fn column_count(&self) -> usize {
        BASE_COLUMNS + self.week_slots.len()
    }

    pub fn value_at(&self, column: usize) -> Option<&CellValue> {
        if column < BASE_COLUMNS {
            self.base_fields()[column].value.as_ref()
        } else {
            self.week_slots
                .get(column - BASE_COLUMNS)
                .and_then(|f| f.value.as_ref())
        }
    }

    pub fn has_flagged_field(&self) -> bool {
        self.base_fields().iter().any(|f| f.is_flagged())
            || self.week_slots.iter().any(Field::is_flagged)
    }
}
