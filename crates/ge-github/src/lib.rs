//! GitHub REST integration for giteagle.
//!
//! Provides:
//! - [`GitHubClient`], the GitHub implementation of [`PlatformClient`]
//! - Pull request, review, and combined-status fetches for PR-centric views
//! - Payload parsing into core records (see [`parse`])

pub mod parse;

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use ge_core::{Event, PlatformClient, PullRequestClient, RawPullRequest, RawReview, Repository};
use regex::Regex;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Platform identifier stored on parsed repositories.
pub const PLATFORM: &str = "github";
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const MAX_ATTEMPTS: u32 = 3;
const MAX_PER_PAGE: usize = 100;
const REPOSITORY_LIST_LIMIT: usize = 100;
const REVIEW_LIST_LIMIT: usize = 100;

static SAFE_PATH_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid path segment regex"));

/// GitHub client errors.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// A value destined for a URL path contained unsafe characters.
    #[error("invalid {name}: {value:?} contains unsafe characters")]
    InvalidPathSegment { name: &'static str, value: String },
    #[error("resource not found: {path}")]
    NotFound { path: String },
    /// The rate limit is exhausted until `reset_at`.
    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// GitHub REST API client.
///
/// # Thread Safety
///
/// The client is cheap to clone and safe to share across tasks. Each clone
/// shares the underlying HTTP connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Creates a client for `api.github.com`.
    ///
    /// Blank tokens are treated as absent (anonymous access).
    pub fn new(token: Option<String>) -> Result<Self, GitHubError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client for a GitHub Enterprise (or test) endpoint.
    pub fn with_base_url(token: Option<String>, base_url: &str) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("giteagle/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(GitHubError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_commits(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Event>, GitHubError> {
        let path = format!("{}/commits", repo_path(repository)?);
        let mut query = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(until) = until {
            query.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let items = self.paginate(&path, &query, limit).await?;
        Ok(parse_each(items, &path, |item| {
            parse::parse_commit(repository, item)
        }))
    }

    /// Pull requests updated at or after `since`, as events.
    async fn get_pull_request_events(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Event>, GitHubError> {
        let path = format!("{}/pulls", repo_path(repository)?);
        let query = [
            ("state", "all".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        let items = self.paginate(&path, &query, limit).await?;
        let parsed = parse_each(items, &path, |item| {
            parse::parse_pull_request(repository, item)
        });
        Ok(parsed
            .into_iter()
            .filter(|pr| match (since, pr.updated_at) {
                (Some(since), Some(updated_at)) => updated_at >= since,
                _ => true,
            })
            .map(|pr| pr.event)
            .collect())
    }

    async fn get_issue_events(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Event>, GitHubError> {
        let path = format!("{}/issues", repo_path(repository)?);
        let mut query = vec![
            ("state", "all".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let items = self.paginate(&path, &query, limit).await?;
        Ok(parse_each(items, &path, |item| {
            parse::parse_issue(repository, item)
        })
        .into_iter()
        .flatten()
        .collect())
    }

    /// Fetches up to `limit` items across pages of a list endpoint.
    async fn paginate(
        &self,
        path: &str,
        query: &[(&str, String)],
        limit: usize,
    ) -> Result<Vec<Value>, GitHubError> {
        let per_page = limit.min(MAX_PER_PAGE);
        let mut results = Vec::new();
        let mut page = 1usize;

        while results.len() < limit {
            let mut page_query = query.to_vec();
            page_query.push(("per_page", per_page.to_string()));
            page_query.push(("page", page.to_string()));

            let Value::Array(items) = self.get_json(path, &page_query).await? else {
                return Err(GitHubError::InvalidResponse(format!(
                    "expected a list from {path}"
                )));
            };
            if items.is_empty() {
                break;
            }
            let short_page = items.len() < per_page;
            results.extend(items);
            if short_page {
                break;
            }
            page += 1;
        }

        results.truncate(limit);
        debug!(path, count = results.len(), "fetched list");
        Ok(results)
    }

    /// GETs a JSON document, retrying timeouts and connection failures with
    /// exponential backoff (1s, 2s).
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, GitHubError> {
        let url = format!("{}{path}", self.base_url);
        let mut attempt = 0;

        loop {
            let mut request = self.http.get(&url).query(query);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => return read_response(path, response).await,
                Err(err) if is_transient(&err) && attempt + 1 < MAX_ATTEMPTS => {
                    let backoff = Duration::from_secs(1 << attempt);
                    warn!(path, attempt, error = %err, ?backoff, "request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl PlatformClient for GitHubClient {
    type Error = GitHubError;

    fn platform_name(&self) -> &'static str {
        PLATFORM
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, GitHubError> {
        let owner = validate_segment(owner, "owner")?;
        let name = validate_segment(name, "name")?;
        parse::parse_repository(self.get_json(&format!("/repos/{owner}/{name}"), &[]).await?)
    }

    async fn list_repositories(
        &self,
        owner: Option<&str>,
        org: Option<&str>,
    ) -> Result<Vec<Repository>, GitHubError> {
        let path = match (org, owner) {
            (Some(org), _) => format!("/orgs/{}/repos", validate_segment(org, "org")?),
            (None, Some(owner)) => format!("/users/{}/repos", validate_segment(owner, "owner")?),
            (None, None) => "/user/repos".to_string(),
        };
        let items = self.paginate(&path, &[], REPOSITORY_LIST_LIMIT).await?;
        Ok(parse_each(items, &path, parse::parse_repository))
    }

    /// Commits, pull requests, and issues are fetched concurrently. A kind
    /// that fails is logged and left out rather than failing the whole call.
    async fn get_activities(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Event>, GitHubError> {
        repo_path(repository)?;
        let (commits, pulls, issues) = tokio::join!(
            self.get_commits(repository, since, until, limit),
            self.get_pull_request_events(repository, since, limit),
            self.get_issue_events(repository, since, limit),
        );
        Ok(merge_activities(
            &repository.full_name(),
            [
                ("commits", commits),
                ("pull_requests", pulls),
                ("issues", issues),
            ],
            limit,
        ))
    }
}

impl PullRequestClient for GitHubClient {
    type Error = GitHubError;

    async fn list_pull_requests(
        &self,
        repository: &Repository,
        state: &str,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>, GitHubError> {
        let path = format!("{}/pulls", repo_path(repository)?);
        let query = [
            ("state", state.to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        let items = self.paginate(&path, &query, limit).await?;
        Ok(parse_each(items, &path, parse::parse_raw_pull_request))
    }

    async fn get_reviews(
        &self,
        repository: &Repository,
        number: u64,
    ) -> Result<Vec<RawReview>, GitHubError> {
        let path = format!("{}/pulls/{number}/reviews", repo_path(repository)?);
        let items = self.paginate(&path, &[], REVIEW_LIST_LIMIT).await?;
        Ok(parse_each(items, &path, parse::parse_review))
    }

    async fn get_combined_status(
        &self,
        repository: &Repository,
        sha: &str,
    ) -> Result<String, GitHubError> {
        let sha = validate_segment(sha, "sha")?;
        let path = format!("{}/commits/{sha}/status", repo_path(repository)?);
        parse::parse_combined_status(self.get_json(&path, &[]).await?)
    }
}

/// Combines per-kind results newest first, skipping kinds that failed.
fn merge_activities(
    repo_name: &str,
    results: [(&str, Result<Vec<Event>, GitHubError>); 3],
    limit: usize,
) -> Vec<Event> {
    let mut events = Vec::new();
    for (kind, result) in results {
        match result {
            Ok(batch) => events.extend(batch),
            Err(err) => warn!(repo = repo_name, kind, error = %err, "failed to fetch activity"),
        }
    }
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    events
}

/// Applies `parse` to each item, logging and dropping the ones that fail.
fn parse_each<T>(
    items: Vec<Value>,
    path: &str,
    mut parse: impl FnMut(Value) -> Result<T, GitHubError>,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match parse(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(path, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn validate_segment<'a>(value: &'a str, name: &'static str) -> Result<&'a str, GitHubError> {
    if SAFE_PATH_SEGMENT.is_match(value) {
        Ok(value)
    } else {
        Err(GitHubError::InvalidPathSegment {
            name,
            value: value.to_string(),
        })
    }
}

fn repo_path(repository: &Repository) -> Result<String, GitHubError> {
    let owner = validate_segment(&repository.owner, "owner")?;
    let name = validate_segment(&repository.name, "name")?;
    Ok(format!("/repos/{owner}/{name}"))
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

async fn read_response(path: &str, response: Response) -> Result<Value, GitHubError> {
    let status = response.status();
    if let Some(reset_at) = rate_limit_reset(status, response.headers()) {
        return Err(GitHubError::RateLimited { reset_at });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound {
            path: path.to_string(),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(GitHubError::Api {
            status: status.as_u16(),
            message: api_error_message(status, &body),
        });
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|err| GitHubError::InvalidResponse(err.to_string()))
}

/// Reset time of an exhausted rate limit, if this response reports one.
fn rate_limit_reset(status: StatusCode, headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if status != StatusCode::FORBIDDEN {
        return None;
    }
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?;
    if remaining.trim() != "0" {
        return None;
    }
    let reset = headers
        .get("x-ratelimit-reset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0);
    Some(DateTime::from_timestamp(reset, 0).unwrap_or_default())
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .map(|payload| payload.message)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use ge_core::{Contributor, EventDetails, EventId, EventKind};

    use super::*;

    fn repo(full_name: &str) -> Repository {
        Repository::from_full_name(PLATFORM, full_name).unwrap()
    }

    fn commit_at(id: &str, hour: u32) -> Event {
        Event {
            id: EventId::new(id).unwrap(),
            kind: EventKind::Commit,
            repository: repo("octocat/hello-world"),
            contributor: Contributor::new("octocat"),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 9, hour, 0, 0).unwrap(),
            title: id.to_string(),
            description: None,
            url: None,
            details: EventDetails::None,
        }
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = GitHubClient::new(Some("ghp_secret".to_string())).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn blank_token_is_anonymous() {
        let client = GitHubClient::new(Some("   ".to_string())).unwrap();
        assert!(client.token.is_none());
        assert!(!format!("{client:?}").contains("[REDACTED]"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GitHubClient::with_base_url(None, "https://ghe.example.com/api/v3/").unwrap();
        assert_eq!(client.base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn path_segments_are_validated() {
        assert!(validate_segment("hello-world.rs_2", "name").is_ok());
        for bad in ["", "../etc", "a/b", "a b", "name?x=1"] {
            assert!(
                matches!(
                    validate_segment(bad, "name"),
                    Err(GitHubError::InvalidPathSegment { name: "name", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn repo_path_rejects_unsafe_owner() {
        let mut repository = repo("octocat/hello-world");
        assert_eq!(repo_path(&repository).unwrap(), "/repos/octocat/hello-world");
        repository.owner = "octo cat".to_string();
        assert!(repo_path(&repository).is_err());
    }

    #[test]
    fn detects_exhausted_rate_limit() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1770000000"));

        let reset_at = rate_limit_reset(StatusCode::FORBIDDEN, &headers).unwrap();
        assert_eq!(reset_at.timestamp(), 1_770_000_000);
        assert_eq!(rate_limit_reset(StatusCode::OK, &headers), None);
    }

    #[test]
    fn forbidden_with_remaining_quota_is_not_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42"));
        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &headers), None);
        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &HeaderMap::new()), None);
    }

    #[test]
    fn api_error_message_prefers_payload() {
        assert_eq!(
            api_error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"Validation Failed"}"#),
            "Validation Failed"
        );
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "HTTP 502"
        );
    }

    #[test]
    fn merge_activities_sorts_truncates_and_skips_failures() {
        let merged = merge_activities(
            "octocat/hello-world",
            [
                ("commits", Ok(vec![commit_at("c1", 9), commit_at("c2", 12)])),
                ("pull_requests", Err(GitHubError::InvalidResponse("boom".into()))),
                ("issues", Ok(vec![commit_at("c3", 10)])),
            ],
            2,
        );
        let ids: Vec<_> = merged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c2", "c3"]);
    }

    #[test]
    fn parse_each_drops_bad_items() {
        let items = vec![
            serde_json::json!({"state": "APPROVED", "user": {"login": "a"}}),
            serde_json::json!({"user": {"login": "b"}}),
        ];
        let reviews = parse_each(items, "/reviews", parse::parse_review);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].reviewer, "a");
    }

    #[test]
    fn error_messages() {
        let err = GitHubError::InvalidPathSegment {
            name: "owner",
            value: "a/b".into(),
        };
        assert_eq!(err.to_string(), r#"invalid owner: "a/b" contains unsafe characters"#);
        let err = GitHubError::NotFound {
            path: "/repos/o/r".into(),
        };
        assert_eq!(err.to_string(), "resource not found: /repos/o/r");
    }
}
