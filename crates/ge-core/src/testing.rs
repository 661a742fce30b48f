//! Event fixtures shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::event::{CommitDetails, Event, EventDetails, IssueDetails, PullRequestDetails};
use crate::event_kind::EventKind;
use crate::repository::{Contributor, Repository};
use crate::types::EventId;

pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn repo(full_name: &str) -> Repository {
    let repo = Repository::from_full_name("github", full_name).expect("valid fixture repo");
    Repository {
        url: format!("https://github.com/{full_name}"),
        ..repo
    }
}

/// Numeric suffix of a fixture id (`"pr-12"` -> 12).
fn number_from_id(id: &str) -> u64 {
    id.rsplit('-').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

pub fn event(
    id: &str,
    kind: EventKind,
    repository: &str,
    username: &str,
    timestamp: DateTime<Utc>,
) -> Event {
    Event {
        id: EventId::new(id).expect("non-empty fixture id"),
        kind,
        repository: repo(repository),
        contributor: Contributor::new(username),
        timestamp,
        title: format!("{kind} {id}"),
        description: None,
        url: None,
        details: EventDetails::None,
    }
}

pub fn commit(id: &str, repository: &str, username: &str, timestamp: DateTime<Utc>) -> Event {
    Event {
        details: EventDetails::Commit(CommitDetails {
            sha: format!("{id:0<40}"),
            parent_shas: vec!["0".repeat(40)],
        }),
        ..event(id, EventKind::Commit, repository, username, timestamp)
    }
}

pub fn pull_request(id: &str, repository: &str, username: &str, created: DateTime<Utc>) -> Event {
    with_pr_details(
        event(id, EventKind::PullRequest, repository, username, created),
        PullRequestDetails {
            number: number_from_id(id),
            ..PullRequestDetails::default()
        },
    )
}

pub fn merged_pull_request(
    id: &str,
    repository: &str,
    username: &str,
    created: DateTime<Utc>,
    merged_at: DateTime<Utc>,
) -> Event {
    with_pr_details(
        event(id, EventKind::PullRequest, repository, username, created),
        PullRequestDetails {
            number: number_from_id(id),
            merged: true,
            merged_at: Some(merged_at),
            closed_at: Some(merged_at),
            ..PullRequestDetails::default()
        },
    )
}

pub fn closed_pull_request(
    id: &str,
    repository: &str,
    username: &str,
    created: DateTime<Utc>,
    closed_at: DateTime<Utc>,
) -> Event {
    with_pr_details(
        event(id, EventKind::PullRequest, repository, username, created),
        PullRequestDetails {
            number: number_from_id(id),
            closed_at: Some(closed_at),
            ..PullRequestDetails::default()
        },
    )
}

pub fn issue(
    id: &str,
    repository: &str,
    username: &str,
    created: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
) -> Event {
    Event {
        details: EventDetails::Issue(IssueDetails {
            number: number_from_id(id),
            closed_at,
            labels: vec![],
        }),
        ..event(id, EventKind::Issue, repository, username, created)
    }
}

fn with_pr_details(event: Event, details: PullRequestDetails) -> Event {
    Event {
        details: EventDetails::PullRequest(details),
        ..event
    }
}
