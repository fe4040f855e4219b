//! Timestamp parsing for CSV cells and query parameters.
//!
//! Keeps the explicit-offset / naive distinction alive via
//! [`RawTimestamp`]: offset-bearing forms are adjusted to UTC, naive forms
//! are carried as-is and reinterpreted as UTC during normalization.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::RawTimestamp;

/// Datetime layouts with an explicit offset (besides RFC 3339 proper).
const OFFSET_FMTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Datetime layouts without any offset marker.
const NAIVE_FMTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a timestamp cell into a [`RawTimestamp`].
///
/// Recognises RFC 3339 (`Z` suffix or numeric offset) and the common naive
/// layouts with `T` or space separators, with or without fractional seconds.
/// The error carries the offending input for row-level reporting.
pub fn parse_timestamp(s: &str) -> Result<RawTimestamp, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(RawTimestamp::Explicit(dt.with_timezone(&Utc)));
    }
    for fmt in OFFSET_FMTS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(RawTimestamp::Explicit(dt.with_timezone(&Utc)));
        }
    }
    for fmt in NAIVE_FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(RawTimestamp::Naive(naive));
        }
    }

    Err(format!("unrecognised timestamp \"{s}\""))
}

/// Parse a query-string date bound into a UTC instant.
///
/// Accepts everything [`parse_timestamp`] does plus plain `YYYY-MM-DD`
/// (interpreted as UTC midnight). Naive forms are reinterpreted as UTC, the
/// same rule ingest applies.
pub fn parse_flexible_date(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
        return Ok(RawTimestamp::Naive(midnight).normalize());
    }
    parse_timestamp(s).map(|raw| raw.normalize())
}
