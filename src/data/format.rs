//! Display helpers for weather values

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Text shown when a date string cannot be parsed
pub const INVALID_DATE: &str = "Invalid Date";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format an ISO 8601 date or datetime as e.g. "Mon, Jan 15, 2024"
///
/// Accepts RFC 3339 timestamps, naive datetimes with a `T` or space
/// separator, and plain `YYYY-MM-DD` dates. Anything else yields
/// [`INVALID_DATE`].
pub fn format_date(date_str: &str) -> String {
    match parse_date(date_str.trim()) {
        Some(date) => date.format("%a, %b %-d, %Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Format a wind speed in m/s with two decimals
pub fn format_wind(speed: f64) -> String {
    format!("{:.2} m/s", speed)
}
