const TASK_PREFIX: &str = "ISTHA";
const TASK_SHORT_SUFFIX: &str = "-BR16";
const TASK_LONG_PREFIX: &str = "ISTHA Task ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLabels {
    pub short: String,
    pub long: String,
}

pub fn translate_pay_type(code: &str) -> String {
    match code {
        "ST" => "Regular Hours".to_string(),
        "DT" => "Double Time".to_string(),
        "OT" => "Overtime".to_string(),
        other => other.to_string(),
    }
}

fn task_suffix(code: &str) -> Option<&'static str> {
    match code {
        "4" => Some(" (Professional SVS Eng)"),
        "5" => Some(" (UR Supp Splicing)"),
        "2C" => Some(" (Prof SVS PM)"),
        "11" => Some(" (Watch/Protect)"),
        _ => None,
    }
}

pub fn translate_task(code: &str) -> TaskLabels {
    let mut long = format!("{TASK_LONG_PREFIX}{code}");
    if let Some(suffix) = task_suffix(code) {
        long.push_str(suffix);
    }
    TaskLabels {
        short: format!("{TASK_PREFIX}{code}{TASK_SHORT_SUFFIX}"),
        long,
    }
}

/// The task code is everything before the first `-` of a work description.
pub fn task_code(description: &str) -> &str {
    description.split('-').next().unwrap_or(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pay_types_translate_and_unknown_codes_pass_through() {
        assert_eq!(translate_pay_type("ST"), "Regular Hours");
        assert_eq!(translate_pay_type("DT"), "Double Time");
        assert_eq!(translate_pay_type("OT"), "Overtime");
        assert_eq!(translate_pay_type("SST"), "SST");
        assert_eq!(translate_pay_type(""), "");
    }

    #[test]
    fn pay_type_translation_is_idempotent() {
        for code in ["ST", "DT", "OT", "Holiday", "Regular Hours"] {
            let once = translate_pay_type(code);
            assert_eq!(translate_pay_type(&once), once);
        }
    }

    #[test]
    fn known_task_codes_get_descriptive_suffix() {
        let labels = translate_task("4");
        assert_eq!(labels.short, "ISTHA4-BR16");
        assert_eq!(labels.long, "ISTHA Task 4 (Professional SVS Eng)");
        assert_eq!(translate_task("5").long, "ISTHA Task 5 (UR Supp Splicing)");
        assert_eq!(translate_task("2C").long, "ISTHA Task 2C (Prof SVS PM)");
        assert_eq!(translate_task("11").long, "ISTHA Task 11 (Watch/Protect)");
    }

    #[test]
    fn unknown_task_codes_have_no_suffix() {
        let labels = translate_task("7");
        assert_eq!(labels.short, "ISTHA7-BR16");
        assert_eq!(labels.long, "ISTHA Task 7");
    }

    #[test]
    fn task_code_stops_at_first_dash() {
        assert_eq!(task_code("4-Fiber splicing - site B"), "4");
        assert_eq!(task_code("2C"), "2C");
        assert_eq!(task_code(""), "");
    }
}
