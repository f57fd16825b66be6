//! Wire models for the Jira REST and Tempo timesheet APIs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::JiraError;

/// One worklog entry as returned by the Tempo search endpoint.
///
/// The endpoint returns many more fields; only the ones the uploader
/// consults are modeled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub issue: WorklogIssue,
    pub started: DateTime<Utc>,
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub worker: Option<String>,
}

/// The issue a worklog is billed against.
#[derive(Debug, Clone, Deserialize)]
pub struct WorklogIssue {
    pub key: String,
}

/// Issue details the uploader needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: i64,
    pub key: String,
    pub summary: String,
}

/// An issue as Jira serves it: the numeric id arrives as a JSON string.
#[derive(Debug, Deserialize)]
pub(crate) struct IssueRaw {
    id: String,
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    summary: String,
}

impl TryFrom<IssueRaw> for Issue {
    type Error = JiraError;

    fn try_from(raw: IssueRaw) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .parse()
            .map_err(|_| JiraError::InvalidResponse(format!("non-numeric issue id: {}", raw.id)))?;
        Ok(Self {
            id,
            key: raw.key,
            summary: raw.fields.summary,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionsResponse {
    pub(crate) permissions: IssuePermissions,
}

/// The permission entries the uploader consults.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuePermissions {
    /// Ability to log work done against an issue.
    #[serde(rename = "WORK_ON_ISSUES")]
    pub work_on_issues: PermissionEntry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    pub have_permission: bool,
}

/// Body of a worklog search. Tempo searches by calendar day, so only the
/// date portion of the bounds goes on the wire.
#[derive(Debug, Serialize)]
pub(crate) struct WorklogSearch {
    pub(crate) from: String,
    pub(crate) to: String,
}

impl WorklogSearch {
    pub(crate) fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: from.format("%Y-%m-%d").to_string(),
            to: to.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Body of a worklog creation request. Optional fields ride along as
/// null/empty defaults.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewWorklogBody<'a> {
    attributes: serde_json::Map<String, serde_json::Value>,
    billable_seconds: Option<i64>,
    comment: Option<&'a str>,
    end_date: Option<&'a str>,
    include_non_working_days: bool,
    origin_id: i64,
    origin_task_id: i64,
    remaining_estimate: Option<i64>,
    started: String,
    time_spent_seconds: i64,
    worker: &'a str,
}

impl<'a> NewWorklogBody<'a> {
    pub(crate) fn new(
        issue_id: i64,
        started: DateTime<Utc>,
        seconds: i64,
        worker: &'a str,
    ) -> Self {
        Self {
            attributes: serde_json::Map::new(),
            billable_seconds: None,
            comment: None,
            end_date: None,
            include_non_working_days: false,
            origin_id: -1,
            origin_task_id: issue_id,
            remaining_estimate: None,
            started: started.to_rfc3339_opts(SecondsFormat::Millis, true),
            time_spent_seconds: seconds,
            worker,
        }
    }
}
