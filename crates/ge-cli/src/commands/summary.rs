//! Summary command aggregating activity across repositories.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use ge_core::{
    AggregationResult, Aggregator, ContributorStats, EventFilter, PlatformClient, RepositoryStats,
};

use super::util::{fetch_events, parse_repositories};

const FETCH_LIMIT: usize = 100;
const TOP_CONTRIBUTORS: usize = 5;

/// Everything the summary view shows.
#[derive(Debug)]
pub struct SummaryReport {
    pub days: u32,
    pub result: AggregationResult,
    pub top_contributors: Vec<(String, usize)>,
    /// Most active first.
    pub repositories: Vec<RepositoryStats>,
    pub author: Option<(String, Option<ContributorStats>)>,
}

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    days: u32,
    author: Option<&str>,
    max_concurrent: usize,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: PlatformClient + Clone + 'static,
    W: Write,
{
    let repositories = parse_repositories(client.platform_name(), repos);
    let since = now - Duration::days(i64::from(days));
    let events = fetch_events(client, &repositories, Some(since), FETCH_LIMIT, max_concurrent).await;

    let mut aggregator = Aggregator::new();
    aggregator.add_events(events);
    let report = build_report(&aggregator, since, days, author);

    write!(writer, "{}", format_summary(&report))?;
    Ok(())
}

/// Aggregates everything at or after `since`.
pub fn build_report(
    aggregator: &Aggregator,
    since: DateTime<Utc>,
    days: u32,
    author: Option<&str>,
) -> SummaryReport {
    let filter = EventFilter::new().since(since);
    let result = aggregator.aggregate(&filter);

    let mut windowed = Aggregator::new();
    windowed.add_events(result.events.iter().cloned());

    let repositories = windowed
        .top_repositories(usize::MAX)
        .into_iter()
        .filter_map(|(name, _)| windowed.repository_stats(&name))
        .collect();

    SummaryReport {
        days,
        top_contributors: windowed.top_contributors(TOP_CONTRIBUTORS),
        repositories,
        author: author.map(|name| (name.to_string(), windowed.contributor_stats(name))),
        result,
    }
}

fn write_counts(output: &mut String, rows: &[(String, usize)]) {
    let name_width = rows.iter().map(|(n, _)| n.chars().count()).max().unwrap_or(0);
    let count_width = rows.iter().map(|(_, c)| c.to_string().len()).max().unwrap_or(0);
    for (name, count) in rows {
        writeln!(output, "  {name:<name_width$}  {count:>count_width$}").unwrap();
    }
}

/// Most frequent first; ties keep map order.
fn sorted_counts<K: ToString>(counts: impl IntoIterator<Item = (K, usize)>) -> Vec<(String, usize)> {
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect();
    rows.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    rows
}

/// Format the summary report.
pub fn format_summary(report: &SummaryReport) -> String {
    let mut output = String::new();
    let result = &report.result;

    writeln!(output, "Summary (last {} days)", report.days).unwrap();
    writeln!(output, "Total activities: {}", result.total_count).unwrap();
    writeln!(output, "Repositories:     {}", result.by_repository.len()).unwrap();
    writeln!(output, "Contributors:     {}", result.by_contributor.len()).unwrap();

    if !result.by_kind.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "By activity type").unwrap();
        write_counts(&mut output, &sorted_counts(result.by_kind.iter().map(|(k, c)| (k, *c))));
    }

    if !report.top_contributors.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "Top contributors").unwrap();
        write_counts(&mut output, &report.top_contributors);
    }

    if report.repositories.len() > 1 {
        writeln!(output).unwrap();
        writeln!(output, "By repository").unwrap();
        let name_width = report
            .repositories
            .iter()
            .map(|s| s.repository.full_name().len())
            .max()
            .unwrap_or(0);
        for stats in &report.repositories {
            writeln!(
                output,
                "  {:<name_width$}  {} activities, {} contributors",
                stats.repository.full_name(),
                stats.total,
                stats.contributor_count()
            )
            .unwrap();
        }
    }

    if let Some((name, stats)) = &report.author {
        writeln!(output).unwrap();
        match stats {
            None => writeln!(output, "No activity for {name}.").unwrap(),
            Some(stats) => format_contributor(&mut output, stats),
        }
    }

    output
}

fn format_contributor(output: &mut String, stats: &ContributorStats) {
    writeln!(output, "Contributor {}", stats.contributor.username).unwrap();
    writeln!(
        output,
        "  Activities: {} ({} .. {})",
        stats.total,
        stats.first_activity.format("%Y-%m-%d"),
        stats.last_activity.format("%Y-%m-%d")
    )
    .unwrap();
    let repositories = sorted_counts(stats.by_repository.iter().map(|(r, c)| (r, *c)))
        .into_iter()
        .map(|(repo, count)| format!("{repo} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(output, "  Repositories: {repositories}").unwrap();
    write_counts(output, &sorted_counts(stats.by_kind.iter().map(|(k, c)| (k, *c))));
}
