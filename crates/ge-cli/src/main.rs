use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::Parser;
use ge_core::Granularity;
use ge_github::{DEFAULT_BASE_URL, GitHubClient, PLATFORM};
use tracing_subscriber::EnvFilter;

use ge_cli::commands::{activity, config, log, prs, repos, standup, stats, summary, timeline};
use ge_cli::{Cli, Commands, Config, dirs_config_path};

/// The config file in effect: the `--config` argument, else the user file if present.
fn config_file(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    explicit.cloned().or_else(|| {
        dirs_config_path()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists())
    })
}

fn github_client(config: &Config) -> Result<GitHubClient> {
    if config.default_platform != PLATFORM {
        bail!("unsupported platform: {}", config.default_platform);
    }
    if !config.github.has_token() {
        tracing::debug!("no GitHub token configured, using anonymous access");
    }
    let base_url = config
        .github
        .base_url
        .as_deref()
        .unwrap_or(DEFAULT_BASE_URL);
    GitHubClient::with_base_url(config.github.token.clone(), base_url)
        .context("failed to create GitHub client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so tests that already installed a subscriber don't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let mut stdout = std::io::stdout().lock();
    runtime.block_on(dispatch(&mut stdout, command, &config, cli.config.as_ref()))
}

async fn dispatch<W: Write>(
    stdout: &mut W,
    command: &Commands,
    config: &Config,
    explicit_config: Option<&PathBuf>,
) -> Result<()> {
    let client = || github_client(config);
    let max_concurrent = config.max_concurrent_requests;
    let now = Utc::now();

    match command {
        Commands::Repos { owner, org } => {
            repos::run(stdout, &client()?, owner, *org).await?;
        }
        Commands::Activity { repo, days, limit } => {
            activity::run(stdout, &client()?, repo, *days, *limit, now).await?;
        }
        Commands::Summary {
            repos,
            days,
            author,
        } => {
            summary::run(
                stdout,
                &client()?,
                repos,
                *days,
                author.as_deref(),
                max_concurrent,
                now,
            )
            .await?;
        }
        Commands::Timeline {
            repos,
            days,
            granularity,
        } => {
            let granularity = Granularity::from(granularity.as_str());
            timeline::run(stdout, &client()?, repos, *days, granularity, max_concurrent, now)
                .await?;
        }
        Commands::Log { repos, days } => {
            log::run(stdout, &client()?, repos, *days, max_concurrent, now).await?;
        }
        Commands::Standup {
            repos,
            days,
            author,
        } => {
            standup::run(
                stdout,
                &client()?,
                repos,
                *days,
                author.as_deref(),
                max_concurrent,
                Local::now().fixed_offset(),
            )
            .await?;
        }
        Commands::Prs {
            repos,
            author,
            stale_days,
        } => {
            prs::run(
                stdout,
                &client()?,
                repos,
                author.as_deref(),
                stale_days.unwrap_or(config.stale_days),
                max_concurrent,
                now,
            )
            .await?;
        }
        Commands::Stats { repos, days } => {
            stats::run(stdout, &client()?, repos, *days, max_concurrent, now).await?;
        }
        Commands::Config => {
            config::run(stdout, config, config_file(explicit_config).as_deref())?;
        }
    }

    Ok(())
}
