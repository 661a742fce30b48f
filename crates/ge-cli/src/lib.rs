//! Giteagle CLI library.
//!
//! This crate provides the CLI interface for giteagle.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, GitHubConfig, dirs_config_path};
