//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 UTC text with fixed microsecond
//! precision, so lexical order in SQLite equals chronological order.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp, truncated to the stored precision
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    // Round-trip through the storage format so in-memory values compare
    // equal to what a later SELECT returns
    parse(&to_db_string(&now)).unwrap_or(now)
}

/// Format a timestamp for storage
pub fn to_db_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", s, e)))
}
