//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Get a bird's eye view of your repositories.
///
/// Aggregates commits, pull requests, and issues across repositories into
/// summaries, timelines, standups, and pull request metrics.
#[derive(Debug, Parser)]
#[command(name = "giteagle", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List repositories for a user or organization.
    Repos {
        /// User or organization name.
        owner: String,

        /// Treat the owner as an organization.
        #[arg(long)]
        org: bool,
    },

    /// Show recent activity for a repository.
    Activity {
        /// Repository in owner/name form.
        repo: String,

        /// Number of days to look back.
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Maximum number of activities to show.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Show an aggregated summary across repositories.
    Summary {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Number of days to look back.
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Also show a rollup for this contributor.
        #[arg(long)]
        author: Option<String>,
    },

    /// Show an activity timeline across repositories.
    Timeline {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Number of days to analyze.
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Bucket size.
        #[arg(long, default_value = "day", value_parser = ["hour", "day", "week", "month"])]
        granularity: String,
    },

    /// Show a combined commit log across repositories.
    Log {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Number of days to look back.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Summarize recent activity for a daily standup.
    Standup {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Number of days to look back (1 on a Monday covers the weekend).
        #[arg(long, default_value_t = 1)]
        days: u32,

        /// Only include activity by this user.
        #[arg(long)]
        author: Option<String>,
    },

    /// Show open pull requests with review and CI status.
    Prs {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Only show pull requests by this user.
        #[arg(long)]
        author: Option<String>,

        /// Age in days after which a pull request is flagged as stale.
        #[arg(long)]
        stale_days: Option<u32>,
    },

    /// Show pull request cycle-time metrics.
    Stats {
        /// Repositories in owner/name form.
        #[arg(required = true)]
        repos: Vec<String>,

        /// Window size in days; trends compare against the window before it.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Show the effective configuration.
    Config,
}
