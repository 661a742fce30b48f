//! DORA-style pull request metrics.
//!
//! Per-PR cycle times (creation to merge, creation to first review decision)
//! roll up into per-repository medians, merge rate, and weekly throughput.
//! Throughput trends compare the current window with the one before it.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::pull_request::{RawPullRequest, RawReview, by_submission};

/// Relative change beyond which a trend counts as up or down.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.10;

/// Cycle times for a single merged pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrMetrics {
    pub repo_name: String,
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: DateTime<Utc>,
    pub first_review_at: Option<DateTime<Utc>>,
    pub time_to_merge: Duration,
    pub time_to_first_review: Option<Duration>,
}

/// Aggregated metrics for one repository over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoStats {
    pub repo_name: String,
    pub merged_count: usize,
    pub closed_count: usize,
    pub median_time_to_merge: Duration,
    pub median_time_to_first_review: Option<Duration>,
    /// Merged over closed; zero when nothing closed.
    pub merge_rate: f64,
    pub throughput_per_week: f64,
}

/// Direction of change between two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Trend {
    Up,
    Down,
    Stable,
    /// No previous value to compare against.
    NotApplicable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
            Self::NotApplicable => "n/a",
        })
    }
}

/// Builds metrics for every merged pull request; unmerged ones are skipped.
///
/// The first review is the earliest submitted approval, change request, or
/// dismissal. Comments never count.
pub fn build_pr_metrics(
    raw_prs: &[RawPullRequest],
    reviews_by_number: &HashMap<u64, Vec<RawReview>>,
    repo_name: &str,
) -> Vec<PrMetrics> {
    raw_prs
        .iter()
        .filter_map(|pr| {
            let merged_at = pr.merged_at?;
            let first_review_at = reviews_by_number.get(&pr.number).and_then(|reviews| {
                by_submission(reviews)
                    .into_iter()
                    .filter(|r| r.state.is_decision())
                    .find_map(|r| r.submitted_at)
            });

            Some(PrMetrics {
                repo_name: repo_name.to_string(),
                number: pr.number,
                title: pr.title.clone(),
                created_at: pr.created_at,
                merged_at,
                first_review_at,
                time_to_merge: merged_at - pr.created_at,
                time_to_first_review: first_review_at.map(|at| at - pr.created_at),
            })
        })
        .collect()
}

/// Pull requests closed (merged or not) within `[since, until)`.
pub fn closed_between(
    raw_prs: &[RawPullRequest],
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Vec<RawPullRequest> {
    raw_prs
        .iter()
        .filter(|pr| {
            pr.closed_at
                .or(pr.merged_at)
                .is_some_and(|at| at >= since && at < until)
        })
        .cloned()
        .collect()
}

/// Median of a set of durations. Empty input yields zero.
///
/// Even-sized sets average the two middle values.
pub fn median_duration(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::zero();
    }
    let mut sorted = durations.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Merged PRs per week. Windows shorter than a week count as one week.
#[allow(clippy::cast_precision_loss)]
pub fn throughput_per_week(merged_count: usize, window_days: u32) -> f64 {
    let weeks = (f64::from(window_days) / 7.0).max(1.0);
    merged_count as f64 / weeks
}

/// Rolls up per-PR metrics for one repository.
pub fn compute_repo_stats(
    repo_name: &str,
    metrics: &[PrMetrics],
    closed_count: usize,
    window_days: u32,
) -> RepoStats {
    let merged_count = metrics.len();
    let time_to_merge: Vec<Duration> = metrics.iter().map(|m| m.time_to_merge).collect();
    let time_to_first_review: Vec<Duration> = metrics
        .iter()
        .filter_map(|m| m.time_to_first_review)
        .collect();

    RepoStats {
        repo_name: repo_name.to_string(),
        merged_count,
        closed_count,
        median_time_to_merge: median_duration(&time_to_merge),
        median_time_to_first_review: (!time_to_first_review.is_empty())
            .then(|| median_duration(&time_to_first_review)),
        merge_rate: ratio(merged_count, closed_count),
        throughput_per_week: throughput_per_week(merged_count, window_days),
    }
}

/// Combines per-repository stats into a single "Overall" row.
///
/// Cycle times are the median of the per-repository medians.
pub fn overall_stats(stats: &[RepoStats], window_days: u32) -> RepoStats {
    let merged_count = stats.iter().map(|s| s.merged_count).sum();
    let closed_count = stats.iter().map(|s| s.closed_count).sum();
    let time_to_merge: Vec<Duration> = stats.iter().map(|s| s.median_time_to_merge).collect();
    let time_to_first_review: Vec<Duration> = stats
        .iter()
        .filter_map(|s| s.median_time_to_first_review)
        .collect();

    RepoStats {
        repo_name: "Overall".to_string(),
        merged_count,
        closed_count,
        median_time_to_merge: median_duration(&time_to_merge),
        median_time_to_first_review: (!time_to_first_review.is_empty())
            .then(|| median_duration(&time_to_first_review)),
        merge_rate: ratio(merged_count, closed_count),
        throughput_per_week: throughput_per_week(merged_count, window_days),
    }
}

/// Classifies the relative change from `previous` to `current`.
pub fn compute_trend(current: f64, previous: f64, threshold: f64) -> Trend {
    if previous.abs() < f64::EPSILON {
        return Trend::NotApplicable;
    }
    let change = (current - previous) / previous;
    if change > threshold {
        Trend::Up
    } else if change < -threshold {
        Trend::Down
    } else {
        Trend::Stable
    }
}
