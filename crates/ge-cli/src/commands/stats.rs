//! Stats command comparing pull request cycle times across two windows.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use ge_core::metrics::{closed_between, overall_stats};
use ge_core::{
    DEFAULT_TREND_THRESHOLD, PlatformClient, PullRequestClient, RepoStats, Repository, Trend,
    build_pr_metrics, compute_repo_stats, compute_trend, format_duration,
};
use tracing::warn;

use super::util::{display_names, fan_out, parse_repositories, write_table};

const CLOSED_PR_LIMIT: usize = 300;

/// One table row: stats for the current window and the throughput trend.
#[derive(Debug, Clone)]
pub struct StatsRow {
    pub stats: RepoStats,
    pub trend: Trend,
}

/// Stats for `[now - days, now)` and the window before it.
#[derive(Debug, Clone)]
pub struct Windows {
    pub current: RepoStats,
    pub previous: RepoStats,
}

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    days: u32,
    max_concurrent: usize,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: PlatformClient + PullRequestClient + Clone + 'static,
    W: Write,
{
    let repositories = parse_repositories(client.platform_name(), repos);
    let fetched = fan_out(client, &repositories, max_concurrent, move |client, repository| async move {
        repo_windows(&client, &repository, days, now).await
    })
    .await;

    let windows: Vec<Windows> = fetched.into_iter().map(|(_, windows)| windows).collect();
    write!(writer, "{}", format_stats(&build_rows(&windows, days), days))?;
    Ok(())
}

async fn repo_windows<C>(
    client: &C,
    repository: &Repository,
    days: u32,
    now: DateTime<Utc>,
) -> Result<Windows>
where
    C: PullRequestClient,
{
    let full_name = repository.full_name();
    let window = Duration::days(i64::from(days));
    let raw = client
        .list_pull_requests(repository, "closed", CLOSED_PR_LIMIT)
        .await?;

    let current = closed_between(&raw, now - window, now);
    let previous = closed_between(&raw, now - window * 2, now - window);

    let mut reviews = HashMap::new();
    for pr in current.iter().filter(|pr| pr.merged_at.is_some()) {
        match client.get_reviews(repository, pr.number).await {
            Ok(list) => {
                reviews.insert(pr.number, list);
            }
            Err(err) => warn!(repo = %full_name, number = pr.number, error = %err, "failed to fetch reviews"),
        }
    }

    let current_metrics = build_pr_metrics(&current, &reviews, &full_name);
    let previous_metrics = build_pr_metrics(&previous, &HashMap::new(), &full_name);

    Ok(Windows {
        current: compute_repo_stats(&full_name, &current_metrics, current.len(), days),
        previous: compute_repo_stats(&full_name, &previous_metrics, previous.len(), days),
    })
}

/// One row per repository, plus an "Overall" row when there are several.
pub fn build_rows(windows: &[Windows], days: u32) -> Vec<StatsRow> {
    let row = |current: RepoStats, previous: &RepoStats| StatsRow {
        trend: compute_trend(
            current.throughput_per_week,
            previous.throughput_per_week,
            DEFAULT_TREND_THRESHOLD,
        ),
        stats: current,
    };

    let mut rows: Vec<StatsRow> = windows
        .iter()
        .map(|w| row(w.current.clone(), &w.previous))
        .collect();

    if windows.len() > 1 {
        let current: Vec<RepoStats> = windows.iter().map(|w| w.current.clone()).collect();
        let previous: Vec<RepoStats> = windows.iter().map(|w| w.previous.clone()).collect();
        rows.push(row(
            overall_stats(&current, days),
            &overall_stats(&previous, days),
        ));
    }
    rows
}

const fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "^ up",
        Trend::Down => "v down",
        Trend::Stable => "= stable",
        Trend::NotApplicable => "--",
    }
}

/// Format the stats table.
pub fn format_stats(rows: &[StatsRow], days: u32) -> String {
    let mut output = String::new();

    if rows.iter().all(|r| r.stats.merged_count == 0) {
        writeln!(output, "No merged pull requests found in the specified period.").unwrap();
        return output;
    }

    let names = display_names(rows.iter().map(|r| r.stats.repo_name.as_str()));
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let stats = &row.stats;
            let time_to_merge = if stats.merged_count == 0 {
                "--".to_string()
            } else {
                format_duration(stats.median_time_to_merge)
            };
            vec![
                names[&stats.repo_name].clone(),
                stats.merged_count.to_string(),
                time_to_merge,
                stats
                    .median_time_to_first_review
                    .map_or_else(|| "--".to_string(), format_duration),
                format!("{:.0}%", stats.merge_rate * 100.0),
                format!("{:.1}", stats.throughput_per_week),
                trend_label(row.trend).to_string(),
            ]
        })
        .collect();

    writeln!(output, "Pull request stats (last {days} days)").unwrap();
    writeln!(output).unwrap();
    write_table(
        &mut output,
        &[
            "Repo",
            "Merged",
            "Median TTM",
            "Median TTFR",
            "Merge rate",
            "PRs/week",
            "Trend",
        ],
        &cells,
    );
    output
}

#[cfg(test)]
mod tests {
    use ge_core::ReviewState;
    use insta::assert_snapshot;

    use super::*;
    use crate::commands::fixtures::{FakeClient, closed_pr, merged_pr, review, ts};

    fn client() -> FakeClient {
        FakeClient::default()
            .with_pulls(
                "org/api",
                vec![
                    merged_pr(1, ts(2026, 2, 16, 0, 0), ts(2026, 2, 17, 6, 0)),
                    merged_pr(2, ts(2026, 2, 20, 0, 0), ts(2026, 2, 20, 3, 30)),
                    closed_pr(3, ts(2026, 2, 18, 0, 0), ts(2026, 2, 19, 0, 0)),
                    merged_pr(4, ts(2026, 2, 5, 0, 0), ts(2026, 2, 6, 0, 0)),
                ],
            )
            .with_pulls(
                "org/web",
                vec![
                    merged_pr(5, ts(2026, 2, 10, 0, 0), ts(2026, 2, 16, 0, 0)),
                    merged_pr(6, ts(2026, 2, 2, 0, 0), ts(2026, 2, 3, 0, 0)),
                    merged_pr(7, ts(2026, 2, 3, 0, 0), ts(2026, 2, 4, 0, 0)),
                ],
            )
            .with_reviews(
                "org/api",
                1,
                vec![review("bob", ReviewState::Approved, ts(2026, 2, 16, 2, 0))],
            )
            .with_reviews(
                "org/api",
                2,
                vec![review("bob", ReviewState::Commented, ts(2026, 2, 20, 1, 0))],
            )
    }

    #[tokio::test]
    async fn compares_current_and_previous_windows() {
        let repos = vec!["org/api".to_string(), "org/web".to_string()];
        let mut output = Vec::new();
        run(&mut output, &client(), &repos, 14, 4, ts(2026, 3, 1, 0, 0))
            .await
            .unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Pull request stats (last 14 days)

        Repo     Merged  Median TTM  Median TTFR  Merge rate  PRs/week  Trend
        api      2       16h 45m     2h           67%         1.0       ^ up
        web      1       6d          --           100%        0.5       v down
        Overall  3       3d 8h       2h           75%         1.5       = stable
        ");
    }

    #[tokio::test]
    async fn single_repository_has_no_overall_row() {
        let mut output = Vec::new();
        run(&mut output, &client(), &["org/web".to_string()], 14, 4, ts(2026, 3, 1, 0, 0))
            .await
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("web "));
        assert!(!output.contains("Overall"));
    }

    #[test]
    fn no_previous_activity_has_no_trend() {
        let window = |merged: usize| RepoStats {
            repo_name: "org/api".to_string(),
            merged_count: merged,
            closed_count: merged,
            median_time_to_merge: Duration::hours(1),
            median_time_to_first_review: None,
            merge_rate: 1.0,
            throughput_per_week: ge_core::metrics::throughput_per_week(merged, 7),
        };
        let rows = build_rows(
            &[Windows {
                current: window(2),
                previous: window(0),
            }],
            7,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trend, Trend::NotApplicable);
    }

    #[tokio::test]
    async fn nothing_merged() {
        let client = FakeClient::default().with_pulls(
            "org/api",
            vec![closed_pr(3, ts(2026, 2, 18, 0, 0), ts(2026, 2, 19, 0, 0))],
        );
        let mut output = Vec::new();
        run(&mut output, &client, &["org/api".to_string()], 14, 4, ts(2026, 3, 1, 0, 0))
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "No merged pull requests found in the specified period.\n"
        );
    }
}
