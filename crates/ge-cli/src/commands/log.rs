//! Log command showing a unified commit history across repositories.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use ge_core::{Aggregator, CommitDetails, Event, EventFilter, EventKind, PlatformClient};

use super::util::{display_names, fetch_events, parse_repositories, truncate};

const FETCH_LIMIT: usize = 200;
const MESSAGE_CHARS: usize = 60;

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    days: u32,
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
    let commits = aggregator
        .aggregate(&EventFilter::new().kinds([EventKind::Commit]).since(since))
        .events;

    write!(writer, "{}", format_log(&commits))?;
    Ok(())
}

/// Format commits, newest first, grouped under their commit date.
pub fn format_log(commits: &[Event]) -> String {
    let mut output = String::new();

    if commits.is_empty() {
        writeln!(output, "No commits found.").unwrap();
        return output;
    }

    let full_names: BTreeSet<String> = commits.iter().map(|c| c.repository.full_name()).collect();
    let names = display_names(full_names.iter().map(String::as_str));
    let name_width = names.values().map(|n| n.chars().count()).max().unwrap_or(0);

    let mut current_date: Option<NaiveDate> = None;
    for commit in commits {
        let date = commit.timestamp.date_naive();
        let prefix = if current_date == Some(date) {
            format!("│ {:10}", "")
        } else {
            current_date = Some(date);
            format!("● {}", date.format("%Y-%m-%d"))
        };

        let name = &names[&commit.repository.full_name()];
        let details = commit.commit();
        let sha = details.map_or("", CommitDetails::short_sha);
        let merge = if details.is_some_and(CommitDetails::is_merge) {
            " (merge)"
        } else {
            ""
        };

        writeln!(
            output,
            "{prefix}  {name:<name_width$}  {sha:<7}  {}{merge}",
            truncate(&commit.title, MESSAGE_CHARS)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {} commits across {} repositories",
        commits.len(),
        full_names.len()
    )
    .unwrap();
    output
}
