//! Review and CI reconciliation for open pull requests.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::pull_request::{RawPullRequest, RawReview, ReviewState, by_submission};

/// CI state used when a commit has no combined status.
pub const UNKNOWN_CI_STATE: &str = "unknown";

/// Reconciled review disposition of one pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStatus {
    pub approved: usize,
    pub changes_requested: usize,
}

impl ReviewStatus {
    /// True when no reviewer's final state is approved or changes requested.
    pub const fn is_pending(&self) -> bool {
        self.approved == 0 && self.changes_requested == 0
    }

    /// Overall state. Changes requested dominates approved, which dominates pending.
    pub const fn summary(&self) -> ReviewSummary {
        if self.changes_requested > 0 {
            ReviewSummary::ChangesRequested
        } else if self.approved > 0 {
            ReviewSummary::Approved
        } else {
            ReviewSummary::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSummary {
    ChangesRequested,
    Approved,
    Pending,
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChangesRequested => "changes_requested",
            Self::Approved => "approved",
            Self::Pending => "pending",
        })
    }
}

/// Collapses raw reviews to each reviewer's latest decision and tallies them.
///
/// Dismissed reviews supersede earlier decisions but count toward neither tally.
pub fn reconcile_reviews(reviews: &[RawReview]) -> ReviewStatus {
    let mut latest: HashMap<&str, ReviewState> = HashMap::new();
    for review in by_submission(reviews) {
        if review.state.is_decision() {
            latest.insert(review.reviewer.as_str(), review.state);
        }
    }

    let mut status = ReviewStatus::default();
    for state in latest.values() {
        match state {
            ReviewState::Approved => status.approved += 1,
            ReviewState::ChangesRequested => status.changes_requested += 1,
            _ => {}
        }
    }
    status
}

/// Looks up the combined CI state of a commit, defaulting to `"unknown"`.
pub fn reconcile_ci(commit_sha: &str, statuses: &HashMap<String, String>) -> String {
    statuses
        .get(commit_sha)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CI_STATE.to_string())
}

/// Presentation model for an open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestInfo {
    pub repo_name: String,
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub head_sha: String,
    pub review_status: ReviewStatus,
    pub ci_status: String,
    pub url: String,
}

impl PullRequestInfo {
    /// Whether the pull request was opened more than `stale_days` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_days: u32) -> bool {
        self.created_at < now - Duration::days(i64::from(stale_days))
    }
}

/// Builds one [`PullRequestInfo`] per raw pull request.
pub fn build_pr_infos(
    raw_prs: &[RawPullRequest],
    reviews_by_number: &HashMap<u64, Vec<RawReview>>,
    ci_by_sha: &HashMap<String, String>,
    repo_name: &str,
) -> Vec<PullRequestInfo> {
    raw_prs
        .iter()
        .map(|pr| {
            let reviews = reviews_by_number
                .get(&pr.number)
                .map_or(&[][..], Vec::as_slice);
            PullRequestInfo {
                repo_name: repo_name.to_string(),
                number: pr.number,
                title: pr.title.clone(),
                author: pr.author.clone(),
                created_at: pr.created_at,
                labels: pr.labels.clone(),
                head_sha: pr.head_sha.clone(),
                review_status: reconcile_reviews(reviews),
                ci_status: reconcile_ci(&pr.head_sha, ci_by_sha),
                url: pr.url.clone(),
            }
        })
        .collect()
}
