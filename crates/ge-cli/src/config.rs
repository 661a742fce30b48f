//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// GitHub connection settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token. Anonymous access when unset.
    pub token: Option<String>,
    /// API endpoint override for GitHub Enterprise.
    pub base_url: Option<String>,
}

impl GitHubConfig {
    /// Whether a non-blank token is configured.
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub github: GitHubConfig,
    /// Platform used for repository arguments.
    pub default_platform: String,
    /// Upper bound on in-flight API requests.
    pub max_concurrent_requests: usize,
    /// Age in days after which an open pull request is stale.
    pub stale_days: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github", &self.github)
            .field("default_platform", &self.default_platform)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("stale_days", &self.stale_days)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            default_platform: "github".to_string(),
            max_concurrent_requests: 10,
            stale_days: 7,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/giteagle/config.toml`, the
    /// given file, `GITEAGLE_*` variables, then `GITHUB_TOKEN`.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let user_config = dirs_config_path().map(|dir| dir.join("config.toml"));
        file_layers(user_config.as_deref(), config_path)
            // Nested keys use a double underscore: GITEAGLE_GITHUB__BASE_URL
            .merge(Env::prefixed("GITEAGLE_").split("__"))
            .merge(
                Env::raw()
                    .only(&["GITHUB_TOKEN"])
                    .map(|_| "github.token".into()),
            )
            .extract()
    }
}

/// Defaults overlaid with the user config file and an explicit file.
fn file_layers(user_config: Option<&Path>, config_path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = user_config {
        figment = figment.merge(Toml::file(path));
    }
    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }
    figment
}

/// Returns the platform-specific config directory for giteagle.
///
/// On Linux: `~/.config/giteagle`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("giteagle"))
}
