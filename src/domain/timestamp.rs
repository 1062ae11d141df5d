//! Helpers for the backend's ISO-8601 timestamp strings.
//!
//! Records keep timestamps as the raw strings the backend returned so that
//! monthly bucketing can compare them lexically. These helpers produce the
//! canonical `YYYY-MM-DDTHH:MM:SS.sssZ` form used for range bounds and parse
//! the raw strings when a chronological value is needed.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Formats an instant as a UTC ISO string with millisecond precision.
#[must_use]
pub fn to_iso_millis<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a backend timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00.000Z`, `...+02:00`), the
/// PostgreSQL text form (`2024-03-01 10:00:00+00`) and offset-less values,
/// which are taken as UTC. Returns `None` for anything else.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

/// Parses a `YYYY-MM-DD` calendar date, ignoring any trailing time part.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
