//! Error model for Jira API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the Jira client.
#[derive(Debug, Error)]
pub enum JiraError {
    /// A credential field failed validation.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("http {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
