//! Prs command listing open pull requests with review and CI state.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use ge_core::{
    PlatformClient, PullRequestClient, PullRequestInfo, Repository, ReviewSummary, age_display,
    build_pr_infos,
};
use tracing::warn;

use super::util::{display_names, fan_out, parse_repositories, truncate, write_table};

const OPEN_PR_LIMIT: usize = 100;
const TITLE_CHARS: usize = 50;
const MAX_LABELS: usize = 3;

pub async fn run<C, W>(
    writer: &mut W,
    client: &C,
    repos: &[String],
    author: Option<&str>,
    stale_days: u32,
    max_concurrent: usize,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: PlatformClient + PullRequestClient + Clone + 'static,
    W: Write,
{
    let repositories = parse_repositories(client.platform_name(), repos);
    let fetched = fan_out(client, &repositories, max_concurrent, |client, repository| async move {
        open_pull_requests(&client, &repository).await
    })
    .await;

    let mut infos: Vec<PullRequestInfo> = fetched.into_iter().flat_map(|(_, infos)| infos).collect();
    if let Some(author) = author {
        infos.retain(|info| info.author == author);
    }
    infos.sort_by_key(|info| info.created_at);

    write!(writer, "{}", format_prs(&infos, now, stale_days))?;
    Ok(())
}

/// Open pull requests of one repository with their reviews and CI state.
///
/// Review and status lookups that fail degrade to "pending" and "unknown".
async fn open_pull_requests<C>(client: &C, repository: &Repository) -> Result<Vec<PullRequestInfo>>
where
    C: PullRequestClient,
{
    let full_name = repository.full_name();
    let raw = client
        .list_pull_requests(repository, "open", OPEN_PR_LIMIT)
        .await?;

    let mut reviews = HashMap::new();
    let mut statuses = HashMap::new();
    for pr in &raw {
        match client.get_reviews(repository, pr.number).await {
            Ok(list) => {
                reviews.insert(pr.number, list);
            }
            Err(err) => warn!(repo = %full_name, number = pr.number, error = %err, "failed to fetch reviews"),
        }
        if pr.head_sha.is_empty() {
            continue;
        }
        match client.get_combined_status(repository, &pr.head_sha).await {
            Ok(state) => {
                statuses.insert(pr.head_sha.clone(), state);
            }
            Err(err) => warn!(repo = %full_name, number = pr.number, error = %err, "failed to fetch status"),
        }
    }

    Ok(build_pr_infos(&raw, &reviews, &statuses, &full_name))
}

fn review_label(info: &PullRequestInfo) -> String {
    let status = info.review_status;
    match status.summary() {
        ReviewSummary::ChangesRequested => format!("changes ({})", status.changes_requested),
        ReviewSummary::Approved => format!("approved ({})", status.approved),
        ReviewSummary::Pending => "pending".to_string(),
    }
}

fn ci_label(state: &str) -> &'static str {
    match state {
        "success" => "pass",
        "failure" | "error" => "fail",
        "pending" => "pending",
        _ => "--",
    }
}

/// Format open pull requests in the given order.
pub fn format_prs(infos: &[PullRequestInfo], now: DateTime<Utc>, stale_days: u32) -> String {
    let mut output = String::new();

    if infos.is_empty() {
        writeln!(output, "No open pull requests found.").unwrap();
        return output;
    }

    let names = display_names(infos.iter().map(|info| info.repo_name.as_str()));
    let rows: Vec<Vec<String>> = infos
        .iter()
        .map(|info| {
            let mut age = age_display(info.created_at, now);
            if info.is_stale(now, stale_days) {
                age.push_str(" (stale)");
            }
            let labels: Vec<&str> = info
                .labels
                .iter()
                .take(MAX_LABELS)
                .map(String::as_str)
                .collect();
            vec![
                names[&info.repo_name].clone(),
                format!("#{} {}", info.number, truncate(&info.title, TITLE_CHARS)),
                info.author.clone(),
                age,
                review_label(info),
                ci_label(&info.ci_status).to_string(),
                labels.join(", "),
            ]
        })
        .collect();

    writeln!(output, "Open pull requests ({})", infos.len()).unwrap();
    writeln!(output).unwrap();
    write_table(
        &mut output,
        &["Repo", "Pull request", "Author", "Age", "Review", "CI", "Labels"],
        &rows,
    );
    output
}
