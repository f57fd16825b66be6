//! Parsing of `--from`/`--until` arguments.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Parses a range argument as either an RFC 3339 timestamp or a plain
/// calendar date taken as midnight UTC.
pub fn parse_date_arg(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }
    anyhow::bail!(
        "invalid value {value:?}, expected a date such as 2024-01-10 or 2024-01-10T09:00:00Z"
    )
}
