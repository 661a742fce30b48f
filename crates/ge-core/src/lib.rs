//! Core domain logic for cross-repository activity analysis.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: normalized commits, pull requests, and issues from any platform
//! - Aggregation: filtering, rollups, timelines, and top-N rankings
//! - Standups: windowed per-repository activity for daily reports
//! - Pull request views: review/CI reconciliation and cycle-time metrics
//!
//! Nothing here performs I/O. Platform adapters implement [`PlatformClient`]
//! and hand fully-parsed records to these functions.

mod aggregator;
pub mod event;
pub mod event_kind;
mod filter;
pub mod format;
pub mod metrics;
mod platform;
pub mod pull_request;
mod rank;
pub mod repository;
pub mod review;
pub mod standup;
#[cfg(test)]
mod testing;
pub mod timeline;
pub mod types;

pub use aggregator::{AggregationResult, Aggregator, ContributorStats, RepositoryStats};
pub use event::{
    CommitDetails, Event, EventDetails, IssueDetails, PullRequestDetails, parse_timestamp,
};
pub use event_kind::{EventKind, UnknownEventKind};
pub use filter::{EventFilter, filter_events};
pub use format::{age_display, format_duration};
pub use metrics::{
    DEFAULT_TREND_THRESHOLD, PrMetrics, RepoStats, Trend, build_pr_metrics, compute_repo_stats,
    compute_trend,
};
pub use platform::{PlatformClient, PullRequestClient};
pub use pull_request::{RawPullRequest, RawReview, ReviewState};
pub use rank::top_n;
pub use repository::{Contributor, Repository};
pub use review::{PullRequestInfo, ReviewStatus, ReviewSummary, build_pr_infos};
pub use standup::{RepoStandup, build_standup, compute_standup_since};
pub use timeline::Granularity;
pub use types::{EventId, ValidationError};
