//! `count_weekdays`: count dates in a file that fall on a given weekday.

use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Deserialize;

use crate::error::ToolError;

const TOOL: &str = "count_weekdays";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
];

#[derive(Debug, Clone, Deserialize)]
pub struct CountWeekdaysArgs {
    pub filepath: String,
    pub weekday_name: String,
}

pub fn count_weekdays(args: &CountWeekdaysArgs) -> Result<String, ToolError> {
    let target = parse_weekday(&args.weekday_name).ok_or_else(|| {
        ToolError::argument(TOOL, format!("unknown weekday '{}'", args.weekday_name))
    })?;

    let contents = std::fs::read_to_string(&args.filepath)
        .with_context(|| format!("reading {}", args.filepath))
        .map_err(|e| ToolError::execution(TOOL, e))?;

    let count = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_date)
        .filter(|date| date.weekday() == target)
        .count();

    Ok(count.to_string())
}

/// Accept full English names and three-letter abbreviations, any case.
fn parse_weekday(name: &str) -> Option<Weekday> {
    let name = name.trim().to_lowercase();
    if name.len() < 3 {
        return None;
    }
    [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ]
    .into_iter()
    .find(|(full, _)| full.starts_with(name.as_str()))
    .map(|(_, day)| day)
}

fn parse_date(line: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(line) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(line, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(line, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn args_for(contents: &str, weekday: &str) -> (NamedTempFile, CountWeekdaysArgs) {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        let args = CountWeekdaysArgs {
            filepath: file.path().to_string_lossy().into_owned(),
            weekday_name: weekday.to_string(),
        };
        (file, args)
    }

    #[test]
    fn one_of_each_weekday() {
        let week = "2024-01-01\n2024-01-02\n2024-01-03\n2024-01-04\n2024-01-05\n2024-01-06\n2024-01-07\n";
        for day in ["Monday", "wednesday", "SUN", "fri"] {
            let (_file, args) = args_for(week, day);
            assert_eq!(count_weekdays(&args).unwrap(), "1", "{day}");
        }
    }

    #[test]
    fn mixed_formats_and_noise() {
        let contents = "2024/01/03\nJan 10, 2024\n\nnot a date\n2024-01-17 08:30:00\n2024-01-18\n";
        let (_file, args) = args_for(contents, "Wednesday");
        assert_eq!(count_weekdays(&args).unwrap(), "3");
    }

    #[test]
    fn unknown_weekday_is_argument_error() {
        let (_file, args) = args_for("2024-01-01\n", "Funday");
        assert!(matches!(count_weekdays(&args), Err(ToolError::Argument { .. })));
    }

    #[test]
    fn parses_rfc3339() {
        assert_eq!(
            parse_date("2024-01-03T10:00:00+05:30"),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
    }
}
