//! CLI subcommand implementations.

pub mod activity;
pub mod config;
pub mod log;
pub mod prs;
pub mod repos;
pub mod standup;
pub mod stats;
pub mod summary;
pub mod timeline;
mod util;

#[cfg(test)]
mod fixtures;
