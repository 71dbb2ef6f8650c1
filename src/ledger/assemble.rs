use crate::ledger::codes::{task_code, translate_pay_type, translate_task};
use crate::ledger::field::{CellValue, Field, Record, format_date};
use crate::ledger::timesheet::{DAYS_PER_WEEK, ParsedTimesheet, TimesheetEntry};
use crate::ledger::weeks::week_of_month;
use chrono::{Days, NaiveDate};
use std::collections::VecDeque;

/// Labels a record needs besides the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct Stamp<'a> {
    pub name: Option<&'a CellValue>,
    pub approver: &'a str,
    pub status: &'a str,
}

fn time_type(pay_type: Option<&CellValue>) -> Option<CellValue> {
    pay_type.map(|code| match code {
        CellValue::Text(raw) => CellValue::Text(translate_pay_type(raw)),
        other => other.clone(),
    })
}

/// `week - 1` blank slots followed by the hours.
pub fn week_slots(date: NaiveDate, hours: &CellValue) -> Vec<Field> {
    let week = week_of_month(date) as usize;
    let mut slots = vec![Field::empty(); week - 1];
    slots.push(Field::new(hours.clone()));
    slots
}

fn build_record(
    entry: &TimesheetEntry,
    date: NaiveDate,
    hours: &CellValue,
    stamp: Stamp<'_>,
) -> Record {
    let description = entry.description.to_string();
    let labels = translate_task(task_code(&description));
    Record {
        lead: Field::text(""),
        name: Field::checked(stamp.name.cloned()),
        task_short: Field::text(labels.short),
        task_long: Field::text(labels.long),
        date: Field::text(format_date(date)),
        note: Field::checked(entry.note.clone()),
        description: Field::checked(Some(entry.description.clone())),
        time_type: Field::from_option(time_type(entry.pay_type.as_ref())),
        approver: Field::text(stamp.approver),
        status: Field::text(stamp.status),
        hours: Field::checked(Some(hours.clone())),
        week_slots: week_slots(date, hours),
    }
}

fn record_for_day(
    entry: &TimesheetEntry,
    week_start: NaiveDate,
    day: usize,
    stamp: Stamp<'_>,
) -> Option<Record> {
    let hours = &entry.hours[day];
    if hours.is_zero() {
        return None;
    }
    let date = week_start + Days::new(day as u64);
    Some(build_record(entry, date, hours, stamp))
}

/// One record per day of the week with nonzero hours, Sunday first.
pub fn assemble(entry: &TimesheetEntry, week_start: NaiveDate, stamp: Stamp<'_>) -> Vec<Record> {
    (0..DAYS_PER_WEEK)
        .filter_map(|day| record_for_day(entry, week_start, day, stamp))
        .collect()
}

/// Records for a whole timesheet, grouped by day and then by task line.
pub fn assemble_timesheet(parsed: &ParsedTimesheet, approver: &str, status: &str) -> Vec<Record> {
    let stamp = Stamp {
        name: parsed.employee.as_ref(),
        approver,
        status,
    };
    let mut per_line: Vec<VecDeque<Record>> = parsed
        .entries
        .iter()
        .map(|entry| assemble(entry, parsed.week_start, stamp).into())
        .collect();

    // Each line holds at most one record per date, already in day order.
    let mut out = Vec::new();
    for date in parsed.dates() {
        let label = CellValue::Text(format_date(date));
        for records in &mut per_line {
            if records
                .front()
                .is_some_and(|r| r.date.value.as_ref() == Some(&label))
            {
                out.extend(records.pop_front());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::field::Annotation;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry(description: &str, hours: [f64; 7]) -> TimesheetEntry {
        TimesheetEntry {
            description: CellValue::text(description),
            note: Some(CellValue::text("site visit")),
            pay_type: Some(CellValue::text("ST")),
            hours: hours.map(CellValue::Number),
        }
    }

    fn stamp(name: &CellValue) -> Stamp<'_> {
        Stamp {
            name: Some(name),
            approver: "Ann Brown",
            status: "Approved",
        }
    }

    #[test]
    fn only_nonzero_days_produce_records() {
        let name = CellValue::text("Jane Doe");
        let week_start = ymd(2024, 3, 3);
        let records = assemble(
            &entry("4-Splicing", [0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0]),
            week_start,
            stamp(&name),
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        let tuesday = ymd(2024, 3, 5);
        assert_eq!(record.date.value, Some(CellValue::text("03/05/2024")));
        assert_eq!(record.hours.value, Some(CellValue::Number(5.0)));

        let week = week_of_month(tuesday) as usize;
        assert_eq!(record.week_slots.len(), week);
        assert_eq!(
            record.week_slots[week - 1].value,
            Some(CellValue::Number(5.0))
        );
        assert!(record.week_slots[..week - 1].iter().all(|f| f.value.is_none()));
    }

    #[test]
    fn codes_and_labels_are_translated() {
        let name = CellValue::text("Jane Doe");
        let records = assemble(
            &entry("4-Splicing", [0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ymd(2024, 3, 3),
            stamp(&name),
        );
        let record = &records[0];
        assert_eq!(record.name.value, Some(CellValue::text("Jane Doe")));
        assert_eq!(record.task_short.value, Some(CellValue::text("ISTHA4-BR16")));
        assert_eq!(
            record.task_long.value,
            Some(CellValue::text("ISTHA Task 4 (Professional SVS Eng)"))
        );
        assert_eq!(record.time_type.value, Some(CellValue::text("Regular Hours")));
        assert_eq!(record.approver.value, Some(CellValue::text("Ann Brown")));
        assert_eq!(record.status.value, Some(CellValue::text("Approved")));
        assert!(!record.has_flagged_field());
    }

    #[test]
    fn week_placement_shifts_by_bucket() {
        let name = CellValue::text("Jane Doe");
        // March 2024: the 3rd is week 1, the 10th week 2, the 31st week 5.
        for (start, want_slots) in [
            (ymd(2024, 3, 3), 1usize),
            (ymd(2024, 3, 10), 2),
            (ymd(2024, 3, 17), 3),
            (ymd(2024, 3, 24), 4),
            (ymd(2024, 3, 31), 5),
        ] {
            let records = assemble(
                &entry("5", [8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                start,
                stamp(&name),
            );
            let slots = &records[0].week_slots;
            assert_eq!(slots.len(), want_slots, "week of {start}");
            assert_eq!(slots.last().and_then(|f| f.value.clone()), Some(CellValue::Number(8.0)));
            assert_eq!(records[0].column_count(), 11 + want_slots);
        }
    }

    #[test]
    fn blank_fields_are_flagged() {
        let mut line = entry("11-Watch", [0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        line.note = None;
        line.hours[1] = CellValue::text("  ");
        let records = assemble(
            &line,
            ymd(2024, 3, 3),
            Stamp {
                name: None,
                approver: "AB",
                status: "Approved",
            },
        );
        let record = &records[0];
        assert_eq!(record.name.annotation, Some(Annotation::NeedsAttention));
        assert_eq!(record.note.annotation, Some(Annotation::NeedsAttention));
        assert_eq!(record.hours.annotation, Some(Annotation::NeedsAttention));
        assert_eq!(record.description.annotation, None);
        assert_eq!(record.task_short.annotation, None);
    }

    #[test]
    fn timesheet_records_are_grouped_by_day() {
        let parsed = ParsedTimesheet {
            week_start: ymd(2024, 3, 3),
            employee: Some(CellValue::text("Jane Doe")),
            entries: vec![
                entry("4-A", [0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 0.0]),
                entry("5-B", [0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ],
        };
        let records = assemble_timesheet(&parsed, "AB", "Approved");
        let got: Vec<(String, String)> = records
            .iter()
            .map(|r| {
                (
                    r.date.value.as_ref().map(ToString::to_string).unwrap_or_default(),
                    r.description.value.as_ref().map(ToString::to_string).unwrap_or_default(),
                )
            })
            .collect();
        assert_eq!(
            got,
            vec![
                ("03/04/2024".to_string(), "4-A".to_string()),
                ("03/04/2024".to_string(), "5-B".to_string()),
                ("03/05/2024".to_string(), "4-A".to_string()),
            ]
        );
    }
}
