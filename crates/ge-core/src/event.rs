//! Normalized activity events.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event_kind::EventKind;
use crate::repository::{Contributor, Repository};
use crate::types::EventId;

/// A normalized unit of repository history.
///
/// `timestamp` is the canonical "occurred" time: author time for commits,
/// creation time for pull requests and issues. Merge and close times live in
/// [`EventDetails`] and are independent of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Globally unique identifier.
    pub id: EventId,
    pub kind: EventKind,
    pub repository: Repository,
    pub contributor: Contributor,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link to view this event on the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub details: EventDetails,
}

impl Event {
    /// Pull request details, if this event carries them.
    pub const fn pull_request(&self) -> Option<&PullRequestDetails> {
        match &self.details {
            EventDetails::PullRequest(details) => Some(details),
            _ => None,
        }
    }

    /// Issue details, if this event carries them.
    pub const fn issue(&self) -> Option<&IssueDetails> {
        match &self.details {
            EventDetails::Issue(details) => Some(details),
            _ => None,
        }
    }

    /// Commit details, if this event carries them.
    pub const fn commit(&self) -> Option<&CommitDetails> {
        match &self.details {
            EventDetails::Commit(details) => Some(details),
            _ => None,
        }
    }

    /// The pull request or issue number.
    pub fn number(&self) -> Option<u64> {
        self.pull_request()
            .map(|pr| pr.number)
            .or_else(|| self.issue().map(|issue| issue.number))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Kind-specific extras attached to an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetails {
    Commit(CommitDetails),
    PullRequest(PullRequestDetails),
    Issue(IssueDetails),
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitDetails {
    pub sha: String,
    #[serde(default)]
    pub parent_shas: Vec<String>,
}

impl CommitDetails {
    /// First seven characters of the hash.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    /// Whether this commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parent_shas.len() > 1
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestDetails {
    pub number: u64,
    #[serde(default)]
    pub merged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueDetails {
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Parses an RFC 3339 timestamp, returning `None` for empty or malformed input.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            tracing::debug!(value, error = %err, "ignoring malformed timestamp");
            None
        }
    }
}
