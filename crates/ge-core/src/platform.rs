//! The capability set every hosting-platform adapter provides.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::pull_request::{RawPullRequest, RawReview};
use crate::repository::Repository;

/// A hosting platform that can be queried for repositories and activity.
///
/// Implementations parse the platform's wire format themselves; only
/// normalized [`Event`]s and [`Repository`] values cross this boundary.
pub trait PlatformClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Identifier stored in [`Repository::platform`] (e.g. `"github"`).
    fn platform_name(&self) -> &'static str;

    fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> impl Future<Output = Result<Repository, Self::Error>> + Send;

    /// Lists repositories for a user (`owner`), an organization (`org`), or
    /// the authenticated user when both are `None`.
    fn list_repositories(
        &self,
        owner: Option<&str>,
        org: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Repository>, Self::Error>> + Send;

    /// Fetches recent activity, newest first, at most `limit` events.
    fn get_activities(
        &self,
        repository: &Repository,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send;
}

/// Pull request queries backing the review and cycle-time views.
pub trait PullRequestClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists pull requests in `state` (`open`, `closed`, or `all`), most
    /// recently updated first, at most `limit`.
    fn list_pull_requests(
        &self,
        repository: &Repository,
        state: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RawPullRequest>, Self::Error>> + Send;

    fn get_reviews(
        &self,
        repository: &Repository,
        number: u64,
    ) -> impl Future<Output = Result<Vec<RawReview>, Self::Error>> + Send;

    /// Combined CI state of a commit (`success`, `failure`, `pending`, ...).
    fn get_combined_status(
        &self,
        repository: &Repository,
        sha: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
