//! Timestamp conversion for the legacy `created_at` format.

use chrono::{DateTime, Utc};

/// Format of `legacy.created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub const LEGACY_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Output format: ISO-8601 in UTC with an explicit offset.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Convert a legacy timestamp to ISO-8601 UTC; `None` if it does not parse.
pub fn parse_legacy_date(value: &str) -> Option<String> {
    DateTime::parse_from_str(value, LEGACY_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).format(OUTPUT_DATE_FORMAT).to_string())
}
