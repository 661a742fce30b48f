//! Event fixtures and an in-memory platform client for command tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ge_core::{
    CommitDetails, Contributor, Event, EventDetails, EventId, EventKind, IssueDetails,
    PlatformClient, PullRequestClient, PullRequestDetails, RawPullRequest, RawReview, Repository,
    ReviewState,
};

pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn repo(full_name: &str) -> Repository {
    Repository::from_full_name("github", full_name).expect("valid fixture repo")
}

fn event(
    id: &str,
    kind: EventKind,
    full_name: &str,
    username: &str,
    timestamp: DateTime<Utc>,
    details: EventDetails,
) -> Event {
    Event {
        id: EventId::new(id).expect("non-empty fixture id"),
        kind,
        repository: repo(full_name),
        contributor: Contributor::new(username),
        timestamp,
        title: format!("{kind} {id}"),
        description: None,
        url: None,
        details,
    }
}

pub fn commit(id: &str, full_name: &str, username: &str, timestamp: DateTime<Utc>) -> Event {
    event(
        id,
        EventKind::Commit,
        full_name,
        username,
        timestamp,
        EventDetails::Commit(CommitDetails {
            sha: format!("{id}0000000"),
            parent_shas: vec!["p".into()],
        }),
    )
}

pub fn pull_request(
    number: u64,
    full_name: &str,
    username: &str,
    created: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
) -> Event {
    event(
        &format!("pr-{number}"),
        EventKind::PullRequest,
        full_name,
        username,
        created,
        EventDetails::PullRequest(PullRequestDetails {
            number,
            merged: merged_at.is_some(),
            merged_at,
            closed_at: merged_at,
            ..PullRequestDetails::default()
        }),
    )
}

pub fn issue(
    number: u64,
    full_name: &str,
    username: &str,
    created: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
) -> Event {
    event(
        &format!("issue-{number}"),
        EventKind::Issue,
        full_name,
        username,
        created,
        EventDetails::Issue(IssueDetails {
            number,
            closed_at,
            labels: vec![],
        }),
    )
}

/// An open pull request with a head commit `{number}abc`.
pub fn raw_pr(number: u64, author: &str, created_at: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        number,
        title: format!("Change {number}"),
        author: author.to_string(),
        created_at,
        merged_at: None,
        closed_at: None,
        head_sha: format!("{number}abc"),
        labels: vec![],
        url: format!("https://github.com/org/repo/pull/{number}"),
    }
}

pub fn merged_pr(number: u64, created_at: DateTime<Utc>, merged_at: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        merged_at: Some(merged_at),
        closed_at: Some(merged_at),
        ..raw_pr(number, "alice", created_at)
    }
}

pub fn closed_pr(number: u64, created_at: DateTime<Utc>, closed_at: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        closed_at: Some(closed_at),
        ..raw_pr(number, "alice", created_at)
    }
}

pub fn review(reviewer: &str, state: ReviewState, submitted_at: DateTime<Utc>) -> RawReview {
    RawReview {
        reviewer: reviewer.to_string(),
        state,
        submitted_at: Some(submitted_at),
    }
}

/// Serves canned events and pull requests per `owner/name`.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    events: Arc<HashMap<String, Vec<Event>>>,
    pulls: Arc<HashMap<String, Vec<RawPullRequest>>>,
    reviews: Arc<HashMap<(String, u64), Vec<RawReview>>>,
    statuses: Arc<HashMap<String, String>>,
    failing: Arc<HashSet<String>>,
}

impl FakeClient {
    pub fn with_events(mut self, full_name: &str, events: Vec<Event>) -> Self {
        Arc::make_mut(&mut self.events).insert(full_name.to_string(), events);
        self
    }

    pub fn with_pulls(mut self, full_name: &str, pulls: Vec<RawPullRequest>) -> Self {
        Arc::make_mut(&mut self.pulls).insert(full_name.to_string(), pulls);
        self
    }

    pub fn with_reviews(mut self, full_name: &str, number: u64, reviews: Vec<RawReview>) -> Self {
        Arc::make_mut(&mut self.reviews).insert((full_name.to_string(), number), reviews);
        self
    }

    pub fn with_status(mut self, sha: &str, state: &str) -> Self {
        Arc::make_mut(&mut self.statuses).insert(sha.to_string(), state.to_string());
        self
    }

    pub fn failing(mut self, full_name: &str) -> Self {
        Arc::make_mut(&mut self.failing).insert(full_name.to_string());
        self
    }
}

impl PlatformClient for FakeClient {
    type Error = io::Error;

    fn platform_name(&self) -> &'static str {
        "github"
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, io::Error> {
        let full_name = format!("{owner}/{name}");
        if self.failing.contains(&full_name) {
            return Err(io::Error::other("boom"));
        }
        let mut repository = Repository::new("github", owner, name);
        repository.description = Some(format!("The {name} service"));
        Ok(repository)
    }

    async fn list_repositories(
        &self,
        owner: Option<&str>,
        _org: Option<&str>,
    ) -> Result<Vec<Repository>, io::Error> {
        let mut names: Vec<&String> = self.events.keys().collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| repo(name))
            .filter(|r| owner.is_none_or(|o| r.owner == o))
            .collect())
    }

    async fn get_activities(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Event>, io::Error> {
        let mut events: Vec<Event> = self
            .events
            .get(&repository.full_name())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|e| since.is_none_or(|s| e.timestamp >= s))
            .filter(|e| until.is_none_or(|u| e.timestamp <= u))
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}

impl PullRequestClient for FakeClient {
    type Error = io::Error;

    async fn list_pull_requests(
        &self,
        repository: &Repository,
        state: &str,
        limit: usize,
    ) -> Result<Vec<RawPullRequest>, io::Error> {
        let full_name = repository.full_name();
        if self.failing.contains(&full_name) {
            return Err(io::Error::other("boom"));
        }
        let mut pulls: Vec<RawPullRequest> = self
            .pulls
            .get(&full_name)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|pr| match state {
                "open" => pr.closed_at.is_none() && pr.merged_at.is_none(),
                "closed" => pr.closed_at.is_some() || pr.merged_at.is_some(),
                _ => true,
            })
            .collect();
        pulls.truncate(limit);
        Ok(pulls)
    }

    async fn get_reviews(
        &self,
        repository: &Repository,
        number: u64,
    ) -> Result<Vec<RawReview>, io::Error> {
        Ok(self
            .reviews
            .get(&(repository.full_name(), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_combined_status(
        &self,
        _repository: &Repository,
        sha: &str,
    ) -> Result<String, io::Error> {
        Ok(self
            .statuses
            .get(sha)
            .cloned()
            .unwrap_or_else(|| "pending".to_string()))
    }
}
