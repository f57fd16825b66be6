//! Resolution of the `[begin, until)` range reconciled by one run.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::interval::Span;
use crate::service::{ServiceError, Timesheet};

/// Lookback windows probed when no explicit begin is given, smallest
/// first. Probing small-to-large keeps the common case (last submission
/// yesterday) to a single query while still finding submissions from a
/// few weeks away.
const LOOKBACK_DAYS: [i64; 3] = [1, 7, 31];

/// The `[begin, until)` range reconciled by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub begin: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl SyncWindow {
    /// Whether a completed record falls entirely within the window.
    pub fn contains(&self, span: &Span) -> bool {
        Span {
            start: self.begin,
            end: self.until,
        }
        .contains(span)
    }
}

/// Failure to resolve a window begin.
#[derive(Debug, Error)]
pub enum WindowError {
    /// Even the largest lookback held no submitted worklog.
    #[error("no worklog found within {days} days before {until}")]
    NoPriorWorklog { until: DateTime<Utc>, days: i64 },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Resolves the sync window ending at `until`.
///
/// With an explicit `begin` the window is used as given. Otherwise the
/// begin is the end of the most recent already-submitted worklog, found
/// by [`last_submission_end`].
pub async fn resolve_window<T: Timesheet>(
    timesheet: &T,
    begin: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
) -> Result<SyncWindow, WindowError> {
    let begin = match begin {
        Some(begin) => begin,
        None => last_submission_end(timesheet, until).await?,
    };
    Ok(SyncWindow { begin, until })
}

/// Finds the instant the most recent submitted worklog finished,
/// searching backward from `until` through widening lookback windows.
///
/// Stops at the first lookback that holds any worklog; among those the
/// latest-started one wins. Fails once the largest lookback comes back
/// empty.
pub async fn last_submission_end<T: Timesheet>(
    timesheet: &T,
    until: DateTime<Utc>,
) -> Result<DateTime<Utc>, WindowError> {
    for days in LOOKBACK_DAYS {
        let from = until - Duration::days(days);
        tracing::debug!(%from, %until, "looking for submitted worklogs");

        let worklogs = timesheet.worklogs_between(from, until).await?;
        let Some(last) = worklogs.into_iter().max_by_key(|worklog| worklog.started) else {
            continue;
        };

        tracing::info!(
            issue = %last.issue_key,
            started = %last.started,
            finished = %last.finished(),
            "last submission found"
        );
        return Ok(last.finished());
    }
    Err(WindowError::NoPriorWorklog {
        until,
        days: LOOKBACK_DAYS[LOOKBACK_DAYS.len() - 1],
    })
}
