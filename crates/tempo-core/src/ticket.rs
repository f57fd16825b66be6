//! Billing ticket keys and the tag-based ticket lookup.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Project keys that worklogs may be billed against.
pub const TICKET_PROJECTS: [&str; 2] = ["CSD", "INT"];

/// Pre-compiled whole-string ticket pattern: project key, `-`, digits.
static TICKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{})-\d+$", TICKET_PROJECTS.join("|"))).unwrap()
});

/// The given value does not name a ticket.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not a valid ticket key: {value}")]
pub struct InvalidTicket {
    pub value: String,
}

/// A validated billing ticket key, e.g. `CSD-123`.
///
/// Matching is case-sensitive; interactive input is uppercased before
/// validation, tags are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketKey(String);

impl TicketKey {
    /// Validates a ticket key against the whole-string pattern.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidTicket> {
        let value = value.into();
        if TICKET_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidTicket { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TicketKey {
    type Error = InvalidTicket;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TicketKey> for String {
    fn from(key: TicketKey) -> Self {
        key.0
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TicketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Finds the first tag naming a ticket, in tag order.
pub fn ticket_from_tags(tags: &[String]) -> Option<TicketKey> {
    tags.iter()
        .find_map(|tag| TicketKey::parse(tag.as_str()).ok())
}
