//! Typed field parsers.
//!
//! Every parser takes the raw cell (or `None` when the column is absent) and
//! returns the typed value or `None`. Malformed input is never an error: the
//! cleaners decide what a missing value becomes.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Cell contents treated as "no value" before any typed parse.
const MISSING_TOKENS: &[&str] = &[
    "", "null", "nan", "-nan", "na", "n/a", "none", "<na>", "#n/a", "#na", "nat",
];

/// Explicit extract format, tried first.
const PRIMARY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Fallback date-only formats.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
];

/// Fallback date-time formats; the time part is dropped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// True when a raw cell carries no value.
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Trimmed cell, or `None` if it is a missing token.
pub fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !is_missing(s))
}

/// Parse a date: `MM/DD/YYYY` first, then general inference.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = present(raw)?;

    if let Some(date) = try_date(s, PRIMARY_DATE_FORMAT) {
        return Some(date);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| try_date(s, fmt))
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|fmt| {
                NaiveDateTime::parse_from_str(s, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .filter(plausible_year)
}

fn try_date(s: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, fmt)
        .ok()
        .filter(plausible_year)
}

// `%Y` happily reads "24" as year 24; let `%y` handle two-digit years.
fn plausible_year(date: &NaiveDate) -> bool {
    use chrono::Datelike;
    (1000..=9999).contains(&date.year())
}

/// Parse a number; non-numeric or non-finite text is missing.
pub fn parse_float(raw: Option<&str>) -> Option<f64> {
    present(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse an integer. Float text is truncated toward zero ("12.7" -> 12).
pub fn parse_int(raw: Option<&str>) -> Option<i64> {
    let s = present(raw)?;
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    parse_float(Some(s))
        .filter(|v| v.abs() < i64::MAX as f64)
        .map(|v| v.trunc() as i64)
}

/// Parse a boolean flag. Unknown or missing values are `false`.
pub fn parse_bool(raw: Option<&str>) -> bool {
    let Some(s) = raw else {
        return false;
    };
    matches!(
        s.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing("NULL"));
        assert!(is_missing("NaN"));
        assert!(is_missing("n/a"));
        assert!(!is_missing("0"));
        assert!(!is_missing("No"));
    }

    #[test]
    fn test_parse_date_primary_format() {
        assert_eq!(parse_date(Some("01/10/2024")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("1/5/2024")), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_parse_date_fallbacks() {
        assert_eq!(parse_date(Some("2024-01-10")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("2024/01/10")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("1/5/24")), Some(date(2024, 1, 5)));
        assert_eq!(parse_date(Some("10 Jan 2024")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("January 10, 2024")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("2024-01-10 13:45:00")), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(Some("2024-01-10T08:00:00Z")), Some(date(2024, 1, 10)));
    }

    #[test]
    fn test_parse_date_malformed_is_missing() {
        assert_eq!(parse_date(Some("not a date")), None);
        assert_eq!(parse_date(Some("13/45/2024")), None);
        assert_eq!(parse_date(Some("NULL")), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_int(Some("12")), Some(12));
        assert_eq!(parse_int(Some(" 12 ")), Some(12));
        assert_eq!(parse_int(Some("12.0")), Some(12));
        assert_eq!(parse_int(Some("12.7")), Some(12));
        assert_eq!(parse_int(Some("twelve")), None);
        assert_eq!(parse_int(Some("inf")), None);
        assert_eq!(parse_float(Some("199.95")), Some(199.95));
        assert_eq!(parse_float(Some("NaN")), None);
        assert_eq!(parse_float(Some("$5")), None);
        assert_eq!(parse_float(None), None);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(Some("YES")));
        assert!(parse_bool(Some("True")));
        assert!(parse_bool(Some("1")));
        assert!(parse_bool(Some("y")));
        assert!(!parse_bool(Some("0")));
        assert!(!parse_bool(Some("No")));
        assert!(!parse_bool(Some("")));
        assert!(!parse_bool(Some("maybe")));
        assert!(!parse_bool(None));
    }
}
