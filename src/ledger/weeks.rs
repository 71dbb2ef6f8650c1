use chrono::{Datelike, NaiveDate};

pub const MAX_WEEKS: u32 = 5;

/// Week index of `date` within its month.
///
/// The partial first week counts as week 1 and weeks roll over on Mondays.
/// Months that start on a Saturday are shifted down by one, so their first
/// Saturday and Sunday land in week 0, and long Sunday-start months can reach
/// week 6.
pub fn raw_week_index(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let first_weekday = first.weekday().num_days_from_monday();
    let adjusted = date.day() + first_weekday - 1;
    let week = adjusted / 7 + 1;
    if first_weekday == 5 { week - 1 } else { week }
}

/// Week bucket used for hour placement, always in `1..=MAX_WEEKS`.
pub fn week_of_month(date: NaiveDate) -> u32 {
    raw_week_index(date).clamp(1, MAX_WEEKS)
}
