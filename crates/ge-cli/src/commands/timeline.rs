//! Timeline command rendering bucketed activity counts as bars.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use ge_core::{Aggregator, Granularity, PlatformClient};

use super::util::{fetch_events, parse_repositories};

const FETCH_LIMIT: usize = 500;
const BAR_WIDTH: usize = 40;

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    days: u32,
    granularity: Granularity,
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
    let counts = aggregator.timeline(granularity, Some(since), None);

    write!(writer, "{}", format_timeline(&counts, granularity))?;
    Ok(())
}

const fn adjective(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Hour => "hourly",
        Granularity::Day => "daily",
        Granularity::Week => "weekly",
        Granularity::Month => "monthly",
    }
}

/// Format bucket counts with bars scaled to the busiest bucket.
pub fn format_timeline(counts: &BTreeMap<String, usize>, granularity: Granularity) -> String {
    let mut output = String::new();

    let Some(max) = counts.values().copied().max().filter(|max| *max > 0) else {
        writeln!(output, "No activity found in the specified period.").unwrap();
        return output;
    };

    writeln!(output, "Activity timeline ({})", adjective(granularity)).unwrap();
    writeln!(output).unwrap();
    for (key, count) in counts {
        let bar = "█".repeat(count * BAR_WIDTH / max);
        writeln!(output, "{key}: {bar} {count}").unwrap();
    }
    output
}
