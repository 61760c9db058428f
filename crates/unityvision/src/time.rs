//! Time utilities for UnityVision.
//!
//! All persisted timestamps are ISO-8601 / RFC 3339 UTC strings.

use chrono::{DateTime, SecondsFormat, Utc};

/// Return the current UTC time as an ISO-8601 string.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a persisted timestamp. Returns `None` for anything malformed;
/// callers decide whether that fails open or closed.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Age of a persisted timestamp in whole seconds relative to `now`.
///
/// `None` if the timestamp does not parse. Timestamps in the future yield a
/// negative age rather than an error.
pub fn age_seconds(timestamp: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_iso8601(timestamp).map(|then| (now - then).num_seconds())
}
