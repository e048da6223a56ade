//! Tolerant parsing of hand-entered training dates.
//!
//! Numeric forms are read month-first; when the first number cannot be a month
//! the day-first reading is tried instead. A value without a four-digit year is
//! read with two-digit years (`25` is 2025), never as year 25.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%d-%b-%Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a raw value into a calendar date, or `None` if no known form fits.
pub fn parse_training_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_compact(value) {
        return Some(date);
    }

    if !has_full_year(value) {
        return parse_with_formats(value, YearWidth::Short);
    }

    if let Some(date) = first_date_match(value, YearWidth::Full) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }

    first_datetime_match(value, YearWidth::Full)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearWidth {
    Full,
    Short,
}

impl YearWidth {
    /// The format as written for four-digit years, or its `%y` variant. Year-first
    /// forms have no short variant.
    fn adapt(self, fmt: &str) -> Option<String> {
        match self {
            YearWidth::Full => Some(fmt.to_string()),
            YearWidth::Short if fmt.starts_with("%Y") => None,
            YearWidth::Short => Some(fmt.replace("%Y", "%y")),
        }
    }
}

fn parse_with_formats(value: &str, width: YearWidth) -> Option<NaiveDate> {
    first_date_match(value, width).or_else(|| first_datetime_match(value, width))
}

fn first_date_match(value: &str, width: YearWidth) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| width.adapt(fmt))
        .find_map(|fmt| NaiveDate::parse_from_str(value, &fmt).ok())
}

fn first_datetime_match(value: &str, width: YearWidth) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| width.adapt(fmt))
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, &fmt).ok())
        .map(|dt| dt.date())
}

/// `YYYY-MM-DD` rendering used in the clean record set.
pub fn canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalizes a raw value straight to its canonical form.
pub fn normalize_training_date(raw: &str) -> Option<String> {
    parse_training_date(raw).map(canonical)
}

// YYYYMMDD, e.g. a date column that was read as an integer.
fn parse_compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// A run of four or more digits is taken as the year; without one "%Y" would read "25" as year 25.
fn has_full_year(value: &str) -> bool {
    value
        .split(|c: char| !c.is_ascii_digit())
        .any(|run| run.len() >= 4)
}
