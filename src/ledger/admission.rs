use crate::error::LedgerError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

pub const DEFAULT_APPROVAL_PATTERN: &str = "Approved [A-Z]{2}";

/// Source files are named like `Jane Doe Timesheet_JD 03032024 Approved AB.csv`:
/// the date after the last underscore picks the ledger month and the last
/// word names the approver.
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    pattern: Regex,
}

impl ApprovalPolicy {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern =
            Regex::new(pattern).with_context(|| format!("invalid approval pattern `{pattern}`"))?;
        Ok(Self { pattern })
    }

    pub fn is_approved(&self, path: &Path) -> bool {
        self.pattern.is_match(&file_name(path))
    }

    pub fn admit(&self, path: &Path) -> Result<(), LedgerError> {
        if self.is_approved(path) {
            Ok(())
        } else {
            Err(LedgerError::NamingPolicyRejection {
                path: path.to_path_buf(),
            })
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn source_date(path: &Path) -> Option<NaiveDate> {
    let name = file_name(path);
    let tail = name.rsplit('_').next()?;
    let raw = tail.split(' ').nth(1)?;
    NaiveDate::parse_from_str(raw, "%m%d%Y").ok()
}

/// Ledger sheet for a source, e.g. `March 2024`.
pub fn sheet_name_from_source(path: &Path) -> Option<String> {
    source_date(path).map(|date| date.format("%B %Y").to_string())
}

pub fn approver_initials_from_source(path: &Path) -> String {
    let stem = file_stem(path);
    stem.rsplit(' ').next().unwrap_or_default().to_string()
}
