//! Database utility functions.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a datetime from RFC3339 or SQLite's default format.
///
/// Timestamps are written as RFC3339, but rows touched by SQLite functions
/// may carry the "YYYY-MM-DD HH:MM:SS" form; both parse to UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
