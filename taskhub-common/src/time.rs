//! Timestamp utilities
//!
//! Timestamps are persisted as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQLite equals
//! chronological order.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp, truncated to the stored precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn from_db(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("bad timestamp {:?}: {}", raw, e)))
}

/// Latest year the fixed-width storage format can hold
const MAX_STORED_YEAR: i32 = 9999;

/// Parse a client-supplied due date
///
/// Accepts a full RFC 3339 timestamp or a plain `YYYY-MM-DD` date, which is
/// taken as midnight UTC. The instant must fall in years 0000-9999 once
/// converted to UTC, or it could not be read back from storage.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    match parsed {
        Some(ts) if (0..=MAX_STORED_YEAR).contains(&ts.year()) => Ok(ts),
        Some(_) => Err(Error::InvalidInput(format!("Due date out of range: {}", raw))),
        None => Err(Error::InvalidInput(format!("Invalid due date: {}", raw))),
    }
}
