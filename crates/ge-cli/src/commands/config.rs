//! Config command showing the effective configuration.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use ge_github::DEFAULT_BASE_URL;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, user_config: Option<&Path>) -> Result<()> {
    write!(writer, "{}", format_config(config, user_config))?;
    Ok(())
}

/// Format settings with the token masked.
pub fn format_config(config: &Config, user_config: Option<&Path>) -> String {
    let mut output = String::new();

    writeln!(output, "Configuration").unwrap();
    writeln!(
        output,
        "  Config file:             {}",
        user_config.map_or_else(|| "none".to_string(), |p| p.display().to_string())
    )
    .unwrap();
    writeln!(output, "  Default platform:        {}", config.default_platform).unwrap();
    writeln!(
        output,
        "  Max concurrent requests: {}",
        config.max_concurrent_requests
    )
    .unwrap();
    writeln!(output, "  Stale days:              {}", config.stale_days).unwrap();
    writeln!(
        output,
        "  GitHub API URL:          {}",
        config.github.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    )
    .unwrap();
    writeln!(
        output,
        "  GitHub token:            {}",
        if config.github.has_token() { "***" } else { "not set" }
    )
    .unwrap();
    output
}
