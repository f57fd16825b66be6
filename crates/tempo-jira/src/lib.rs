//! Async client for the Jira REST and Tempo timesheet APIs.
//!
//! Covers the handful of endpoints the uploader needs: searching and
//! creating Tempo worklogs, fetching an issue, and reading the current
//! actor's permissions on it.
//!
//! See <https://www.tempo.io/server-api-documentation/timesheets> for the
//! timesheet endpoints.

mod error;
mod models;

pub use error::JiraError;
pub use models::{Issue, IssuePermissions, PermissionEntry, Worklog, WorklogIssue};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use models::{IssueRaw, NewWorklogBody, PermissionsResponse, WorklogSearch};

/// Default request timeout for Jira calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details for a Jira instance, loaded once at startup and
/// passed into the client. Nothing else reads them.
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    /// Login username, also recorded as the worker on new worklogs.
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Jira API client.
///
/// Safe to share by reference; each request goes through the same
/// underlying connection pool.
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the given instance.
    ///
    /// # Errors
    ///
    /// Returns an error when any credential field is empty or the HTTP
    /// client fails to build.
    pub fn new(credentials: Credentials) -> Result<Self, JiraError> {
        if credentials.base_url.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "base URL cannot be empty",
            });
        }
        if credentials.username.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "username cannot be empty",
            });
        }
        if credentials.password.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "password cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self { http, credentials })
    }

    /// The actor new worklogs are attributed to.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Fetches the worklogs recorded between the two instants.
    pub async fn worklogs_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Worklog>, JiraError> {
        let body = WorklogSearch::new(from, to);
        let request = self
            .request(Method::POST, "rest/tempo-timesheets/4/worklogs/search")
            .json(&body);
        Self::execute(request).await
    }

    /// Creates a worklog of `seconds` against the issue with the given
    /// numeric id, attributed to the configured username.
    pub async fn add_worklog(
        &self,
        issue_id: i64,
        started: DateTime<Utc>,
        seconds: i64,
    ) -> Result<(), JiraError> {
        let body = NewWorklogBody::new(issue_id, started, seconds, &self.credentials.username);
        let request = self
            .request(Method::POST, "rest/tempo-timesheets/4/worklogs")
            .json(&body);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(JiraError::Http { status, body });
        }
        Ok(())
    }

    /// Fetches an issue by its key.
    pub async fn issue(&self, key: &str) -> Result<Issue, JiraError> {
        let path = format!("rest/api/2/issue/{key}");
        let raw: IssueRaw = Self::execute(self.request(Method::GET, &path)).await?;
        raw.try_into()
    }

    /// Gets the current actor's permissions for the given issue.
    pub async fn my_permissions(&self, key: &str) -> Result<IssuePermissions, JiraError> {
        let request = self
            .request(Method::GET, "rest/api/2/mypermissions")
            .query(&[("issueKey", key)]);
        let response: PermissionsResponse = Self::execute(request).await?;
        Ok(response.permissions)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url_for(path);
        tracing::debug!(%method, %url, "jira request");
        self.http
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    fn url_for(&self, path: &str) -> String {
        let base = self.credentials.base_url.trim_end_matches('/');
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, JiraError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(JiraError::Http { status, body });
        }
        serde_json::from_str(&body).map_err(|err| JiraError::InvalidResponse(err.to_string()))
    }
}
