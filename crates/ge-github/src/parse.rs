//! Conversion from GitHub REST payloads to core records.
//!
//! Payloads are deserialized leniently: optional fields default, and malformed
//! secondary timestamps become `None`. A record without a usable canonical
//! timestamp is rejected with [`GitHubError::InvalidResponse`].

use chrono::{DateTime, Utc};
use ge_core::{
    CommitDetails, Contributor, Event, EventDetails, EventId, EventKind, IssueDetails,
    PullRequestDetails, RawPullRequest, RawReview, Repository, ReviewState, parse_timestamp,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{GitHubError, PLATFORM};

const UNKNOWN_USER: &str = "unknown";
const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
struct User {
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: Owner,
    #[serde(default)]
    html_url: String,
    description: Option<String>,
    default_branch: Option<String>,
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Deserialize)]
struct GitAuthor {
    name: Option<String>,
    email: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitData {
    message: Option<String>,
    author: Option<GitAuthor>,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    html_url: Option<String>,
    author: Option<User>,
    commit: CommitData,
    #[serde(default)]
    parents: Vec<ShaRef>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    #[serde(default)]
    title: String,
    body: Option<String>,
    html_url: Option<String>,
    user: Option<User>,
    created_at: Option<String>,
    updated_at: Option<String>,
    merged_at: Option<String>,
    closed_at: Option<String>,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    head: Option<ShaRef>,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    #[serde(default)]
    title: String,
    body: Option<String>,
    html_url: Option<String>,
    user: Option<User>,
    created_at: Option<String>,
    closed_at: Option<String>,
    #[serde(default)]
    labels: Vec<Label>,
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    user: Option<User>,
    state: String,
    submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedStatusPayload {
    state: String,
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Result<T, GitHubError> {
    serde_json::from_value(data)
        .map_err(|err| GitHubError::InvalidResponse(format!("malformed {what}: {err}")))
}

fn required_timestamp(value: Option<&str>, what: &str) -> Result<DateTime<Utc>, GitHubError> {
    value
        .and_then(parse_timestamp)
        .ok_or_else(|| GitHubError::InvalidResponse(format!("{what} has no valid timestamp")))
}

fn event_id(id: String) -> Result<EventId, GitHubError> {
    EventId::new(id).map_err(|err| GitHubError::InvalidResponse(err.to_string()))
}

fn contributor(user: Option<User>) -> Contributor {
    let user = user.unwrap_or_default();
    Contributor {
        username: user
            .login
            .or_else(|| user.name.clone())
            .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        name: user.name,
        email: user.email,
        avatar_url: user.avatar_url,
    }
}

fn label_names(labels: Vec<Label>) -> Vec<String> {
    labels.into_iter().map(|label| label.name).collect()
}

/// First line of a commit message, capped at 100 characters.
fn summary_line(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

pub fn parse_repository(data: Value) -> Result<Repository, GitHubError> {
    let payload: RepositoryPayload = decode(data, "repository")?;
    let mut repository = Repository::new(PLATFORM, payload.owner.login, payload.name);
    repository.url = payload.html_url;
    repository.description = payload.description;
    if let Some(branch) = payload.default_branch {
        repository.default_branch = branch;
    }
    repository.is_private = payload.private;
    Ok(repository)
}

/// Parses an entry of `GET /repos/{owner}/{repo}/commits`.
///
/// The contributor is the linked GitHub account when there is one, otherwise
/// the git author name.
pub fn parse_commit(repository: &Repository, data: Value) -> Result<Event, GitHubError> {
    let payload: CommitPayload = decode(data, "commit")?;
    let git_author = payload.commit.author;
    let timestamp = required_timestamp(
        git_author.as_ref().and_then(|a| a.date.as_deref()),
        "commit",
    )?;

    let mut contributor = contributor(payload.author);
    if let Some(git_author) = git_author {
        if contributor.username == UNKNOWN_USER {
            if let Some(name) = &git_author.name {
                contributor.username.clone_from(name);
            }
        }
        contributor.name = git_author.name.or(contributor.name);
        contributor.email = git_author.email.or(contributor.email);
    }

    let message = payload.commit.message.unwrap_or_default();
    Ok(Event {
        id: event_id(format!("github:commit:{}", payload.sha))?,
        kind: EventKind::Commit,
        repository: repository.clone(),
        contributor,
        timestamp,
        title: summary_line(&message),
        description: (!message.is_empty()).then_some(message),
        url: payload.html_url,
        details: EventDetails::Commit(CommitDetails {
            sha: payload.sha,
            parent_shas: payload.parents.into_iter().map(|p| p.sha).collect(),
        }),
    })
}

/// A pull request event plus its last update time, used for `since` filtering.
pub struct ParsedPull {
    pub event: Event,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parses an entry of `GET /repos/{owner}/{repo}/pulls`.
///
/// A pull request counts as merged when either the `merged` flag is set or a
/// merge time is present; list responses omit the flag.
pub fn parse_pull_request(repository: &Repository, data: Value) -> Result<ParsedPull, GitHubError> {
    let payload: PullPayload = decode(data, "pull request")?;
    let timestamp = required_timestamp(payload.created_at.as_deref(), "pull request")?;
    let merged_at = payload.merged_at.as_deref().and_then(parse_timestamp);

    let event = Event {
        id: event_id(format!(
            "github:pr:{}:{}",
            repository.full_name(),
            payload.number
        ))?,
        kind: EventKind::PullRequest,
        repository: repository.clone(),
        contributor: contributor(payload.user),
        timestamp,
        title: payload.title,
        description: payload.body,
        url: payload.html_url,
        details: EventDetails::PullRequest(PullRequestDetails {
            number: payload.number,
            merged: payload.merged || merged_at.is_some(),
            merged_at,
            closed_at: payload.closed_at.as_deref().and_then(parse_timestamp),
            additions: payload.additions,
            deletions: payload.deletions,
        }),
    };
    Ok(ParsedPull {
        event,
        updated_at: payload.updated_at.as_deref().and_then(parse_timestamp),
    })
}

/// Parses an entry of `GET /repos/{owner}/{repo}/issues`.
///
/// The issues endpoint also lists pull requests; those yield `Ok(None)`.
pub fn parse_issue(repository: &Repository, data: Value) -> Result<Option<Event>, GitHubError> {
    let payload: IssuePayload = decode(data, "issue")?;
    if payload.pull_request.is_some() {
        return Ok(None);
    }
    let timestamp = required_timestamp(payload.created_at.as_deref(), "issue")?;

    Ok(Some(Event {
        id: event_id(format!(
            "github:issue:{}:{}",
            repository.full_name(),
            payload.number
        ))?,
        kind: EventKind::Issue,
        repository: repository.clone(),
        contributor: contributor(payload.user),
        timestamp,
        title: payload.title,
        description: payload.body,
        url: payload.html_url,
        details: EventDetails::Issue(IssueDetails {
            number: payload.number,
            closed_at: payload.closed_at.as_deref().and_then(parse_timestamp),
            labels: label_names(payload.labels),
        }),
    }))
}

/// Parses a pull request into the raw record used by review and metrics views.
pub fn parse_raw_pull_request(data: Value) -> Result<RawPullRequest, GitHubError> {
    let payload: PullPayload = decode(data, "pull request")?;
    Ok(RawPullRequest {
        number: payload.number,
        created_at: required_timestamp(payload.created_at.as_deref(), "pull request")?,
        title: payload.title,
        author: contributor(payload.user).username,
        merged_at: payload.merged_at.as_deref().and_then(parse_timestamp),
        closed_at: payload.closed_at.as_deref().and_then(parse_timestamp),
        head_sha: payload.head.map(|head| head.sha).unwrap_or_default(),
        labels: label_names(payload.labels),
        url: payload.html_url.unwrap_or_default(),
    })
}

pub fn parse_review(data: Value) -> Result<RawReview, GitHubError> {
    let payload: ReviewPayload = decode(data, "review")?;
    Ok(RawReview {
        reviewer: contributor(payload.user).username,
        state: ReviewState::parse(&payload.state),
        submitted_at: payload.submitted_at.as_deref().and_then(parse_timestamp),
    })
}

/// Extracts the aggregate state (`success`, `failure`, `pending`, ...) from a
/// combined status response.
pub fn parse_combined_status(data: Value) -> Result<String, GitHubError> {
    let payload: CombinedStatusPayload = decode(data, "combined status")?;
    Ok(payload.state)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn repo() -> Repository {
        Repository::from_full_name(PLATFORM, "octocat/hello-world").unwrap()
    }

    #[test]
    fn parses_repository() {
        let data = json!({
            "name": "hello-world",
            "owner": {"login": "octocat"},
            "html_url": "https://github.com/octocat/hello-world",
            "description": "My first repo",
            "default_branch": "trunk",
            "private": true
        });
        let repository = parse_repository(data).unwrap();
        assert_eq!(repository.full_name(), "octocat/hello-world");
        assert_eq!(repository.platform, "github");
        assert_eq!(repository.default_branch, "trunk");
        assert_eq!(repository.description.as_deref(), Some("My first repo"));
        assert!(repository.is_private);
    }

    #[test]
    fn repository_defaults_branch_to_main() {
        let data = json!({"name": "r", "owner": {"login": "o"}, "html_url": ""});
        assert_eq!(parse_repository(data).unwrap().default_branch, "main");
    }

    #[test]
    fn parses_commit() {
        let data = json!({
            "sha": "abc1234567890",
            "html_url": "https://github.com/octocat/hello-world/commit/abc1234567890",
            "author": {"login": "octocat", "avatar_url": "https://avatars/1"},
            "commit": {
                "message": "Fix bug in parser\n\nLonger explanation.",
                "author": {"name": "The Octocat", "email": "octo@example.com", "date": "2026-02-09T10:00:00Z"}
            },
            "parents": [{"sha": "p1"}, {"sha": "p2"}]
        });
        let event = parse_commit(&repo(), data).unwrap();
        assert_eq!(event.id.as_str(), "github:commit:abc1234567890");
        assert_eq!(event.kind, EventKind::Commit);
        assert_eq!(event.title, "Fix bug in parser");
        assert_eq!(event.contributor.username, "octocat");
        assert_eq!(event.contributor.name.as_deref(), Some("The Octocat"));
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2026, 2, 9, 10, 0, 0).unwrap()
        );
        let details = event.commit().unwrap();
        assert_eq!(details.short_sha(), "abc1234");
        assert!(details.is_merge());
    }

    #[test]
    fn commit_without_linked_account_uses_git_author_name() {
        let data = json!({
            "sha": "def",
            "author": null,
            "commit": {"message": "x", "author": {"name": "Jane Doe", "date": "2026-02-09T10:00:00Z"}}
        });
        let event = parse_commit(&repo(), data).unwrap();
        assert_eq!(event.contributor.username, "Jane Doe");
        assert!(!event.commit().unwrap().is_merge());
    }

    #[test]
    fn commit_title_is_capped() {
        let long = "a".repeat(150);
        let data = json!({
            "sha": "def",
            "commit": {"message": long, "author": {"date": "2026-02-09T10:00:00Z"}}
        });
        let event = parse_commit(&repo(), data).unwrap();
        assert_eq!(event.title.len(), 100);
        assert_eq!(event.description.as_deref().map(str::len), Some(150));
    }

    #[test]
    fn commit_without_date_is_rejected() {
        let data = json!({"sha": "def", "commit": {"message": "x", "author": {"date": "garbage"}}});
        assert!(matches!(
            parse_commit(&repo(), data),
            Err(GitHubError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parses_merged_pull_request_from_list_payload() {
        let data = json!({
            "number": 42,
            "title": "Add feature",
            "user": {"login": "alice"},
            "created_at": "2026-02-01T10:00:00Z",
            "updated_at": "2026-02-03T10:00:00Z",
            "merged_at": "2026-02-03T09:00:00Z",
            "closed_at": "2026-02-03T09:00:00Z",
            "head": {"sha": "abc"},
            "labels": [{"name": "enhancement"}]
        });
        let parsed = parse_pull_request(&repo(), data).unwrap();
        assert_eq!(parsed.event.id.as_str(), "github:pr:octocat/hello-world:42");
        assert_eq!(parsed.event.number(), Some(42));
        let details = parsed.event.pull_request().unwrap();
        assert!(details.merged);
        assert!(details.merged_at.is_some());
        assert!(parsed.updated_at.is_some());
    }

    #[test]
    fn malformed_secondary_timestamps_are_dropped() {
        let data = json!({
            "number": 7,
            "title": "Broken dates",
            "user": {"login": "alice"},
            "created_at": "2026-02-01T10:00:00Z",
            "merged_at": "not-a-date",
            "closed_at": ""
        });
        let parsed = parse_pull_request(&repo(), data).unwrap();
        let details = parsed.event.pull_request().unwrap();
        assert!(!details.merged);
        assert_eq!(details.merged_at, None);
        assert_eq!(details.closed_at, None);
    }

    #[test]
    fn issue_endpoint_pull_requests_are_skipped() {
        let data = json!({
            "number": 3,
            "title": "Actually a PR",
            "created_at": "2026-02-01T10:00:00Z",
            "pull_request": {"url": "https://api.github.com/..."}
        });
        assert!(parse_issue(&repo(), data).unwrap().is_none());
    }

    #[test]
    fn parses_issue() {
        let data = json!({
            "number": 5,
            "title": "Crash on start",
            "user": {"login": "bob"},
            "created_at": "2026-02-01T10:00:00Z",
            "closed_at": "2026-02-02T10:00:00Z",
            "labels": [{"name": "bug"}, {"name": "p1"}]
        });
        let event = parse_issue(&repo(), data).unwrap().unwrap();
        assert_eq!(event.id.as_str(), "github:issue:octocat/hello-world:5");
        assert_eq!(event.contributor.username, "bob");
        let details = event.issue().unwrap();
        assert_eq!(details.labels, ["bug", "p1"]);
        assert!(details.closed_at.is_some());
    }

    #[test]
    fn parses_raw_pull_request_and_reviews() {
        let pr = parse_raw_pull_request(json!({
            "number": 9,
            "title": "Refactor",
            "user": {"login": "carol"},
            "created_at": "2026-02-01T10:00:00Z",
            "head": {"sha": "cafe"},
            "html_url": "https://github.com/octocat/hello-world/pull/9"
        }))
        .unwrap();
        assert_eq!(pr.author, "carol");
        assert_eq!(pr.head_sha, "cafe");
        assert_eq!(pr.merged_at, None);

        let review = parse_review(json!({
            "user": {"login": "dave"},
            "state": "APPROVED",
            "submitted_at": "2026-02-02T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(review.reviewer, "dave");
        assert_eq!(review.state, ReviewState::Approved);

        let pending = parse_review(json!({"user": {"login": "erin"}, "state": "PENDING"})).unwrap();
        assert_eq!(pending.submitted_at, None);
    }

    #[test]
    fn parses_combined_status() {
        let state = parse_combined_status(json!({"state": "failure", "statuses": []})).unwrap();
        assert_eq!(state, "failure");
        assert!(parse_combined_status(json!({"statuses": []})).is_err());
    }
}
