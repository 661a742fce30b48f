//! Activity command for a single repository's recent events.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use ge_core::{Event, PlatformClient, Repository};

use super::util::truncate;

const TITLE_CHARS: usize = 60;

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repo: &str,
    days: u32,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: PlatformClient,
    W: Write,
{
    let reference = Repository::from_full_name(client.platform_name(), repo)?;
    let since = now - Duration::days(i64::from(days));

    let repository = client
        .get_repository(&reference.owner, &reference.name)
        .await
        .with_context(|| format!("failed to fetch {repo}"))?;
    let events = client
        .get_activities(&repository, Some(since), None, limit)
        .await
        .with_context(|| format!("failed to fetch activity for {repo}"))?;

    write!(writer, "{}", format_activity(&repository, &events, days))?;
    Ok(())
}

/// Format a repository header followed by its events, newest first.
pub fn format_activity(repository: &Repository, events: &[Event], days: u32) -> String {
    let mut output = String::new();

    writeln!(output, "{}", repository.full_name()).unwrap();
    writeln!(
        output,
        "{}",
        repository.description.as_deref().unwrap_or("No description")
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Activity (last {days} days)").unwrap();

    if events.is_empty() {
        writeln!(output, "No activity found.").unwrap();
        return output;
    }

    let author_width = events
        .iter()
        .map(|e| e.contributor.username.chars().count())
        .max()
        .unwrap_or(0)
        .max("Author".len());

    writeln!(
        output,
        "{:<12}  {:<63}  {:<author_width$}  Date",
        "Type", "Title", "Author"
    )
    .unwrap();
    for event in events {
        writeln!(
            output,
            "{:<12}  {:<63}  {:<author_width$}  {}",
            event.kind.as_str(),
            truncate(&event.title, TITLE_CHARS),
            event.contributor.username,
            event.timestamp.format("%Y-%m-%d %H:%M")
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Total: {} activities", events.len()).unwrap();
    output
}
