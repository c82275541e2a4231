//! Lenient value coercion for loader collaborators.
//!
//! Source inventories arrive as loosely-typed text. Every parser here maps
//! unparsable input to `None` instead of failing, so a single bad cell never
//! aborts an analysis.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a size cell into non-negative bytes.
///
/// Accepts integer or float text; negative, NaN, or non-numeric input
/// becomes `None`. Fractional values truncate.
pub fn parse_size(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return u64::try_from(n).ok();
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f.trunc() as u64),
        _ => None,
    }
}

/// Parse a boolean cell.
///
/// Recognizes true/false, 1/0, yes/no and si/sí (case-insensitive);
/// anything else is `None`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "si" | "sí" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a timestamp cell into a timezone-naive datetime.
///
/// Tries RFC 3339 first (any offset is dropped, keeping the local wall
/// time), then a fixed list of common datetime and date formats. Bare dates
/// resolve to midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
