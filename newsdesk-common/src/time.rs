//! Timestamp utilities
//!
//! All timestamps are stored as RFC 3339 text in UTC.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage (millisecond precision, `Z` suffix)
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time formatted for storage
pub fn now_db() -> String {
    to_db(&now())
}

/// Parse a stored timestamp
pub fn from_db(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_db_format_sorts_lexicographically() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-02T03:04:05.006Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = earlier + chrono::Duration::milliseconds(5);
        assert!(to_db(&earlier) < to_db(&later));
        assert_eq!(to_db(&earlier), "2024-01-02T03:04:05.006Z");
    }

    #[test]
    fn test_from_db_rejects_garbage() {
        assert!(from_db("yesterday").is_err());
        let parsed = from_db("2024-01-02T03:04:05.006Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 6);
    }
}
