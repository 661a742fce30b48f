//! Standup command summarizing what happened since the last working day.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use ge_core::{
    Aggregator, Event, EventFilter, PlatformClient, RepoStandup, build_standup,
    compute_standup_since,
};

use super::util::{fetch_events, parse_repositories, truncate};

const FETCH_LIMIT: usize = 200;
const MAX_COMMITS: usize = 5;
const COMMIT_CHARS: usize = 50;
const ITEM_CHARS: usize = 40;

/// `now` carries the caller's local offset so the window starts at local midnight.
pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    days: u32,
    author: Option<&str>,
    max_concurrent: usize,
    now: DateTime<FixedOffset>,
) -> Result<()>
where
    C: PlatformClient + Clone + 'static,
    W: Write,
{
    let repositories = parse_repositories(client.platform_name(), repos);
    let since_local = compute_standup_since(days, &now);
    let since = since_local.with_timezone(&Utc);
    let events = fetch_events(client, &repositories, Some(since), FETCH_LIMIT, max_concurrent).await;

    let mut aggregator = Aggregator::new();
    aggregator.add_events(events);
    let events = aggregator.filter(&EventFilter::new().contributors(author));
    let standups = build_standup(&events, since);

    write!(
        writer,
        "{}",
        format_standup(&standups, since_local.date_naive(), author)
    )?;
    Ok(())
}

fn write_items(output: &mut String, label: &str, items: &[Event]) {
    if items.is_empty() {
        return;
    }
    let listed = items
        .iter()
        .map(|item| match item.number() {
            Some(number) => format!("#{number} {}", truncate(&item.title, ITEM_CHARS)),
            None => truncate(&item.title, ITEM_CHARS),
        })
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(output, "  {label} ({}): {listed}", items.len()).unwrap();
}

fn write_commits(output: &mut String, commits: &[Event]) {
    if commits.is_empty() {
        return;
    }
    let mut listed = commits
        .iter()
        .take(MAX_COMMITS)
        .map(|commit| truncate(&commit.title, COMMIT_CHARS))
        .collect::<Vec<_>>()
        .join(", ");
    if commits.len() > MAX_COMMITS {
        write!(listed, ", +{} more", commits.len() - MAX_COMMITS).unwrap();
    }
    writeln!(output, "  Commits ({}): {listed}", commits.len()).unwrap();
}

/// Format per-repository standup buckets.
pub fn format_standup(standups: &[RepoStandup], since: NaiveDate, author: Option<&str>) -> String {
    let mut output = String::new();
    let who = author.map(|a| format!(" for {a}")).unwrap_or_default();
    let since_label = since.format("%Y-%m-%d (%a)");

    if standups.is_empty() {
        writeln!(output, "No activity{who} since {}", since.format("%Y-%m-%d")).unwrap();
        return output;
    }

    writeln!(output, "Standup{who} since {since_label}").unwrap();
    writeln!(output, "{}", "─".repeat(50)).unwrap();

    let mut total = 0;
    for standup in standups {
        total += standup.total();
        writeln!(output).unwrap();
        writeln!(output, "{} ({} activities)", standup.repo_name, standup.total()).unwrap();
        write_commits(&mut output, &standup.commits);
        write_items(&mut output, "PRs opened", &standup.prs_opened);
        write_items(&mut output, "PRs merged", &standup.prs_merged);
        write_items(&mut output, "PRs closed", &standup.prs_closed);
        write_items(&mut output, "Issues opened", &standup.issues_opened);
        write_items(&mut output, "Issues closed", &standup.issues_closed);
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {total} activities across {} repositories",
        standups.len()
    )
    .unwrap();
    output
}
