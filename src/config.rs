//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ghmail.toml` files.

use crate::cache::DEFAULT_TTL_SECONDS;
use crate::errors::ConfigError;
use crate::github::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use crate::lookup::DiscoveryConfig;
use crate::report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".ghmail.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Commit-email discovery bounds.
    #[serde(default)]
    pub discovery: DiscoverySection,

    /// Lookup cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Commit-email discovery bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySection {
    /// Repositories whose commit history is scanned.
    #[serde(default = "default_max_repos")]
    pub max_repos: usize,

    /// Commits requested per repository.
    #[serde(default = "default_max_commits")]
    pub max_commits_per_repo: usize,

    /// Repositories requested in the (single) repository list page.
    #[serde(default = "default_repo_page_size")]
    pub repo_page_size: usize,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            max_repos: default_max_repos(),
            max_commits_per_repo: default_max_commits(),
            repo_page_size: default_repo_page_size(),
        }
    }
}

fn default_max_repos() -> usize {
    10
}

fn default_max_commits() -> usize {
    10
}

fn default_repo_page_size() -> usize {
    30
}

impl From<&DiscoverySection> for DiscoveryConfig {
    fn from(section: &DiscoverySection) -> Self {
        DiscoveryConfig {
            max_repos: section.max_repos,
            max_commits_per_repo: section.max_commits_per_repo,
            repo_page_size: section.repo_page_size,
        }
    }
}

/// Lookup cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether lookups are cached at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Cache file location. Defaults to a file in the system temp directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl(),
            path: None,
        }
    }
}

impl CacheConfig {
    /// Where the cache file lives.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ghmail-cache.json"))
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.api.base_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(max_repos) = args.max_repos {
            self.discovery.max_repos = max_repos;
        }
        if let Some(max_commits) = args.max_commits {
            self.discovery.max_commits_per_repo = max_commits;
        }

        if let Some(ttl) = args.cache_ttl {
            self.cache.ttl_seconds = ttl;
        }
        if let Some(ref cache_file) = args.cache_file {
            self.cache.path = Some(cache_file.clone());
        }
        if args.no_cache {
            self.cache.enabled = false;
        }

        if let Some(format) = args.format {
            self.output.format = format;
        }
    }

    /// Reject values that would make lookups misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.api.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(invalid("api.base_url", "must start with 'http://' or 'https://'"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(invalid("api.timeout_seconds", "must be at least 1"));
        }
        if self.discovery.max_repos == 0 {
            return Err(invalid("discovery.max_repos", "must be at least 1"));
        }
        if self.discovery.max_commits_per_repo == 0 {
            return Err(invalid("discovery.max_commits_per_repo", "must be at least 1"));
        }
        if !(1..=100).contains(&self.discovery.repo_page_size) {
            return Err(invalid("discovery.repo_page_size", "must be between 1 and 100"));
        }
        if self.cache.enabled && self.cache.ttl_seconds == 0 {
            return Err(invalid("cache.ttl_seconds", "must be at least 1 when caching is enabled"));
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn invalid(field: &str, detail: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        detail: detail.to_string(),
    }
}
