//! Adapters exposing the Jira client through the engine's collaborator
//! traits.

use chrono::{DateTime, Utc};

use tempo_core::service::{
    Issue, IssueDirectory, NewWorklog, RemoteWorklog, ServiceError, Timesheet,
};
use tempo_core::ticket::TicketKey;
use tempo_jira::Client;

/// The Jira/Tempo instance as seen by the engine.
#[derive(Debug, Clone, Copy)]
pub struct JiraRemote<'a> {
    client: &'a Client,
}

impl<'a> JiraRemote<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl Timesheet for JiraRemote<'_> {
    async fn worklogs_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<RemoteWorklog>, ServiceError> {
        let worklogs = self
            .client
            .worklogs_between(from, until)
            .await
            .map_err(ServiceError::new)?;
        Ok(worklogs
            .into_iter()
            .map(|worklog| RemoteWorklog {
                issue_key: worklog.issue.key,
                started: worklog.started,
                seconds: worklog.time_spent_seconds,
            })
            .collect())
    }

    async fn submit(&self, worklog: &NewWorklog) -> Result<(), ServiceError> {
        self.client
            .add_worklog(worklog.issue_id, worklog.started, worklog.seconds)
            .await
            .map_err(ServiceError::new)
    }
}

impl IssueDirectory for JiraRemote<'_> {
    async fn issue(&self, key: &TicketKey) -> Result<Issue, ServiceError> {
        let issue = self
            .client
            .issue(key.as_str())
            .await
            .map_err(ServiceError::new)?;
        // The server echoes the key back; a mismatch with the ticket
        // pattern (e.g. a moved issue) fails the lookup.
        let key = TicketKey::parse(issue.key).map_err(ServiceError::new)?;
        Ok(Issue {
            id: issue.id,
            key,
            summary: issue.summary,
        })
    }

    async fn can_log_work(&self, key: &TicketKey) -> Result<bool, ServiceError> {
        let permissions = self
            .client
            .my_permissions(key.as_str())
            .await
            .map_err(ServiceError::new)?;
        Ok(permissions.work_on_issues.have_permission)
    }
}
