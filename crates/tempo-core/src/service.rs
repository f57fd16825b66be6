//! Collaborator seams between the engine and the outside world.
//!
//! The engine never talks to Jira, Tempo, or the operator directly; it is
//! handed implementations of these traits. Tests substitute scripted
//! fakes, the CLI wires in the real client and stdin prompting.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::interval::Span;
use crate::ledger::LocalRecord;
use crate::ticket::TicketKey;

/// Error surfaced by an injected collaborator.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ServiceError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl ServiceError {
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(source))
    }
}

/// A worklog already recorded in the remote timesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWorklog {
    /// Key of the issue the worklog is billed against. Not required to
    /// match the local ticket pattern; other tools log work too.
    pub issue_key: String,
    pub started: DateTime<Utc>,
    pub seconds: i64,
}

impl RemoteWorklog {
    /// The instant the logged work ended.
    pub fn finished(&self) -> DateTime<Utc> {
        self.started + Duration::seconds(self.seconds)
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.started,
            end: self.finished(),
        }
    }
}

/// Issue details needed to attribute a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Numeric id, the attribution target for new worklogs.
    pub id: i64,
    pub key: TicketKey,
    pub summary: String,
}

/// A worklog to be created in the remote timesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorklog {
    pub issue_id: i64,
    pub issue_key: TicketKey,
    pub started: DateTime<Utc>,
    pub seconds: i64,
}

/// Remote timesheet operations.
#[allow(async_fn_in_trait)]
pub trait Timesheet {
    /// Fetches the worklogs recorded between the two instants.
    async fn worklogs_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<RemoteWorklog>, ServiceError>;

    /// Creates a new worklog entry.
    async fn submit(&self, worklog: &NewWorklog) -> Result<(), ServiceError>;
}

/// Issue tracker operations.
#[allow(async_fn_in_trait)]
pub trait IssueDirectory {
    /// Looks up the issue behind a ticket key.
    async fn issue(&self, key: &TicketKey) -> Result<Issue, ServiceError>;

    /// Whether the current actor may log work against the ticket.
    async fn can_log_work(&self, key: &TicketKey) -> Result<bool, ServiceError>;
}

/// Interactive fallback for records whose tags carry no ticket key.
pub trait TicketPrompt {
    /// Asks the operator for a ticket key. `None` abandons the record.
    fn request_ticket(&mut self, record: &LocalRecord) -> Result<Option<String>, ServiceError>;
}
