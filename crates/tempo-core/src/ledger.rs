//! The local ledger: Timewarrior records and the `timew export` format.
//!
//! The export stream is a JSON array spread over lines: `[` and `]` on
//! their own lines, one record object per line in between, each line but
//! the last ending in the array comma. Dates use the compact
//! `YYYYMMDDThhmmssZ` pattern, always UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::interval::Span;

/// Date pattern used by `timew export`.
const EXPORT_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Failures while reading the ledger export. All of these abort the run;
/// a malformed record is never silently skipped.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The line was not a well-formed record object.
    #[error("invalid ledger record: {0}")]
    Json(#[from] serde_json::Error),

    /// A date field did not use the export date pattern.
    #[error("unexpected format for ledger date: {value}")]
    Date { value: String },

    /// The record claims to end before it starts.
    #[error("record @{id} ends before it starts")]
    EndBeforeStart { id: u64 },

    /// The export stream could not be read.
    #[error("failed to read ledger export: {0}")]
    Io(#[from] std::io::Error),
}

/// One work interval captured by the local ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecord {
    /// Numeric id, unique within this export only.
    pub id: u64,
    pub start: DateTime<Utc>,
    /// `None` while the record is still being tracked.
    pub end: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl LocalRecord {
    /// The record's interval, once it has ended.
    pub fn span(&self) -> Option<Span> {
        self.end.map(|end| Span {
            start: self.start,
            end,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u64,
    start: String,
    #[serde(default)]
    end: Option<String>,
    tags: Vec<String>,
}

/// Parses a compact export date into a UTC instant.
pub fn parse_export_date(value: &str) -> Result<DateTime<Utc>, LedgerError> {
    NaiveDateTime::parse_from_str(value, EXPORT_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| LedgerError::Date {
            value: value.to_string(),
        })
}

/// Extracts the record payload from one line of an export stream.
///
/// Returns `None` for the array bracket lines and blank lines. Non-final
/// records keep their array comma, which is not part of the JSON.
pub fn record_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "[" || trimmed == "]" {
        return None;
    }
    Some(trimmed.strip_suffix(',').unwrap_or(trimmed))
}

/// Parses one record payload, validating field presence and types.
pub fn parse_record(payload: &str) -> Result<LocalRecord, LedgerError> {
    let raw: RawRecord = serde_json::from_str(payload)?;
    let start = parse_export_date(&raw.start)?;
    let end = raw.end.as_deref().map(parse_export_date).transpose()?;
    if let Some(end) = end {
        if end < start {
            return Err(LedgerError::EndBeforeStart { id: raw.id });
        }
    }
    Ok(LocalRecord {
        id: raw.id,
        start,
        end,
        tags: raw.tags,
    })
}
