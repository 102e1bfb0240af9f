use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::TypeError;

/// Layout of every timestamp revdoc writes (`put_at`, schedule `at`).
///
/// Fixed-width, so string order matches time order.
pub const UTC_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";

/// Format a UTC instant, e.g. `2025-03-01 12:00:00.000000 UTC`.
pub fn format_utc(t: DateTime<Utc>) -> String {
    t.format(UTC_FORMAT).to_string()
}

/// The current time, formatted with [`format_utc`].
pub fn now_utc_string() -> String {
    format_utc(Utc::now())
}

/// Parse a timestamp produced by [`format_utc`].
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>, TypeError> {
    let naive = s
        .strip_suffix(" UTC")
        .and_then(|body| NaiveDateTime::parse_from_str(body, "%Y-%m-%d %H:%M:%S%.f").ok())
        .ok_or_else(|| TypeError::InvalidTimestamp(s.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}
