//! Shared utilities for CLI commands.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ge_core::{Event, PlatformClient, Repository};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Parses `owner/name` arguments, warning about and skipping invalid ones.
pub fn parse_repositories(platform: &str, args: &[String]) -> Vec<Repository> {
    args.iter()
        .filter_map(|arg| match Repository::from_full_name(platform, arg) {
            Ok(repository) => Some(repository),
            Err(err) => {
                eprintln!("Warning: skipping {arg}: {err}");
                None
            }
        })
        .collect()
}

/// Truncates to `max_chars` characters, appending "..." when shortened.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Repository name without the owner.
pub fn short_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

/// Short repository names, or full names when two short names collide.
pub fn display_names<'a>(full_names: impl IntoIterator<Item = &'a str>) -> HashMap<String, String> {
    let full_names: BTreeSet<&str> = full_names.into_iter().collect();
    let mut seen = BTreeSet::new();
    let collides = full_names.iter().any(|name| !seen.insert(short_name(name)));

    full_names
        .into_iter()
        .map(|name| {
            let display = if collides { name } else { short_name(name) };
            (name.to_string(), display.to_string())
        })
        .collect()
}

/// Writes left-aligned columns sized to their widest cell.
pub fn write_table(output: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(output, headers.iter().copied(), &widths);
    for row in rows {
        write_row(output, row.iter().map(String::as_str), &widths);
    }
}

fn write_row<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(output, "{}", line.trim_end()).unwrap();
}

/// Runs `fetch` for each repository concurrently, at most `max_concurrent`
/// at a time.
///
/// Repositories that fail are reported and skipped. Results come back in
/// argument order.
pub async fn fan_out<C, T, F, Fut>(
    client: &C,
    repositories: &[Repository],
    max_concurrent: usize,
    fetch: F,
) -> Vec<(Repository, T)>
where
    C: Clone,
    F: Fn(C, Repository) -> Fut,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, repository) in repositories.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = fetch(client.clone(), repository.clone());
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            (index, repository, work.await)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, repository, Ok(value))) => results.push((index, repository, value)),
            Ok((_, repository, Err(err))) => {
                warn!(repo = %repository.full_name(), error = %err, "failed to fetch");
                eprintln!("Warning: failed to fetch {}: {err:#}", repository.full_name());
            }
            Err(err) => warn!(error = %err, "fetch task failed"),
        }
    }

    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, repository, value)| (repository, value))
        .collect()
}

/// Fetches recent activity for each repository.
///
/// Events come back grouped in argument order, each group newest first.
pub async fn fetch_events<C>(
    client: &C,
    repositories: &[Repository],
    since: Option<DateTime<Utc>>,
    limit: usize,
    max_concurrent: usize,
) -> Vec<Event>
where
    C: PlatformClient + Clone + 'static,
{
    let batches = fan_out(client, repositories, max_concurrent, move |client, repository| async move {
        let resolved = client
            .get_repository(&repository.owner, &repository.name)
            .await?;
        let events = client.get_activities(&resolved, since, None, limit).await?;
        debug!(repo = %resolved.full_name(), count = events.len(), "fetched activity");
        Ok::<_, anyhow::Error>(events)
    })
    .await;

    batches.into_iter().flat_map(|(_, events)| events).collect()
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::commands::fixtures::{FakeClient, commit, ts};

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn short_name_drops_owner() {
        assert_eq!(short_name("org/api"), "api");
        assert_eq!(short_name("api"), "api");
    }

    #[test]
    fn display_names_prefer_short_names() {
        let display = display_names(["org/api", "org/web", "org/api"]);
        assert_eq!(display.len(), 2);
        assert_eq!(display["org/api"], "api");
        assert_eq!(display["org/web"], "web");
    }

    #[test]
    fn display_names_fall_back_on_collision() {
        let display = display_names(["org/api", "fork/api", "org/web"]);
        assert_eq!(display["org/api"], "org/api");
        assert_eq!(display["fork/api"], "fork/api");
        assert_eq!(display["org/web"], "org/web");
    }

    #[test]
    fn table_columns_fit_widest_cell() {
        let mut output = String::new();
        let rows = vec![
            vec!["api".to_string(), "3".to_string(), String::new()],
            vec!["frontend".to_string(), "12".to_string(), "x".to_string()],
        ];
        write_table(&mut output, &["Repo", "Count", "Note"], &rows);
        assert_snapshot!(output, @r"
        Repo      Count  Note
        api       3
        frontend  12     x
        ");
    }

    #[test]
    fn parse_repositories_skips_invalid() {
        let args = vec!["org/api".to_string(), "nope".to_string(), "org/web".to_string()];
        let repos = parse_repositories("github", &args);
        let names: Vec<_> = repos.iter().map(Repository::full_name).collect();
        assert_eq!(names, ["org/api", "org/web"]);
    }

    #[tokio::test]
    async fn fetch_events_keeps_argument_order_and_skips_failures() {
        let client = FakeClient::default()
            .with_events(
                "org/api",
                vec![commit("c1", "org/api", "alice", ts(2026, 2, 9, 10, 0))],
            )
            .with_events(
                "org/web",
                vec![commit("c2", "org/web", "bob", ts(2026, 2, 9, 12, 0))],
            )
            .failing("org/broken");
        let repos = parse_repositories(
            "github",
            &["org/web".to_string(), "org/broken".to_string(), "org/api".to_string()],
        );

        let events = fetch_events(&client, &repos, None, 100, 2).await;
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c2", "c1"]);
    }

    #[tokio::test]
    async fn fetch_events_respects_limit_and_since() {
        let client = FakeClient::default().with_events(
            "org/api",
            vec![
                commit("c1", "org/api", "alice", ts(2026, 2, 9, 10, 0)),
                commit("c2", "org/api", "alice", ts(2026, 2, 1, 10, 0)),
                commit("c3", "org/api", "alice", ts(2026, 2, 10, 10, 0)),
            ],
        );
        let repos = parse_repositories("github", &["org/api".to_string()]);

        let events = fetch_events(&client, &repos, Some(ts(2026, 2, 5, 0, 0)), 1, 1).await;
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c3"]);
    }

    #[tokio::test]
    async fn fan_out_collects_values_in_order() {
        let repos = parse_repositories("github", &["org/b".to_string(), "org/a".to_string()]);
        let results = fan_out(&(), &repos, 1, |(), repository| async move {
            Ok::<_, anyhow::Error>(repository.name.len())
        })
        .await;
        let names: Vec<_> = results.iter().map(|(r, _)| r.full_name()).collect();
        assert_eq!(names, ["org/b", "org/a"]);
    }
}
