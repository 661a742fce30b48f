//! Repository and contributor identity.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::types::{ValidationError, parse_full_name};

/// A person who contributes to repositories.
///
/// Identity is the platform username; the remaining fields are metadata and
/// do not participate in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    /// Username on the platform.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Contributor {
    /// Creates a contributor with only a username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email: None,
            avatar_url: None,
        }
    }
}

impl PartialEq for Contributor {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for Contributor {}

impl Hash for Contributor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}

/// A git repository being tracked.
///
/// Identity is the `(platform, owner, name)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Platform identifier (e.g. "github").
    pub platform: String,
    /// Owner or organization name.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Web URL of the repository.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub is_private: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Repository {
    /// Creates a repository with default metadata.
    pub fn new(
        platform: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            owner: owner.into(),
            name: name.into(),
            url: String::new(),
            description: None,
            default_branch: default_branch(),
            is_private: false,
        }
    }

    /// Creates a repository from an `owner/name` reference.
    pub fn from_full_name(
        platform: impl Into<String>,
        full_name: &str,
    ) -> Result<Self, ValidationError> {
        let (owner, name) = parse_full_name(full_name)?;
        Ok(Self::new(platform, owner, name))
    }

    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.platform == other.platform && self.owner == other.owner && self.name == other.name
    }
}

impl Eq for Repository {}

impl Hash for Repository {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.platform.hash(state);
        self.owner.hash(state);
        self.name.hash(state);
    }
}
