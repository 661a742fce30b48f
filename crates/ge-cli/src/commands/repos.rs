//! Repos command for listing a user's or organization's repositories.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use ge_core::{PlatformClient, Repository};

use super::util::truncate;

const DESCRIPTION_CHARS: usize = 50;

pub async fn run<C, W>(writer: &mut W, client: &C, owner: &str, org: bool) -> Result<()>
where
    C: PlatformClient,
    W: Write,
{
    let repositories = if org {
        client.list_repositories(None, Some(owner)).await
    } else {
        client.list_repositories(Some(owner), None).await
    }
    .with_context(|| format!("failed to list repositories for {owner}"))?;

    write!(writer, "{}", format_repositories(owner, &repositories))?;
    Ok(())
}

/// Format repositories as a table.
pub fn format_repositories(owner: &str, repositories: &[Repository]) -> String {
    let mut output = String::new();

    writeln!(output, "Repositories for {owner}").unwrap();
    writeln!(output).unwrap();

    if repositories.is_empty() {
        writeln!(output, "No repositories found.").unwrap();
        return output;
    }

    let name_width = repositories
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    writeln!(
        output,
        "{:<name_width$}  {:<53}  {:<14}  Private",
        "Name", "Description", "Branch"
    )
    .unwrap();
    for repository in repositories {
        let description = truncate(
            repository.description.as_deref().unwrap_or_default(),
            DESCRIPTION_CHARS,
        );
        writeln!(
            output,
            "{:<name_width$}  {:<53}  {:<14}  {}",
            repository.name,
            description,
            repository.default_branch,
            if repository.is_private { "yes" } else { "no" }
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Total: {} repositories", repositories.len()).unwrap();
    output
}
