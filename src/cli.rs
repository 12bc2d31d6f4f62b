//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Where lookup inputs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Positional arguments, resolved in order.
    Arguments,
    /// Piped stdin, read to the end and resolved line by line.
    Piped,
    /// A terminal on stdin: only the latest line's result is shown.
    Interactive,
}

/// ghmail - find the name and commit email behind a GitHub username
///
/// Looks up a GitHub user's public profile, mines their recent push
/// activity and repository commit history for real commit emails, and
/// falls back to the GitHub-generated noreply address when none is found.
///
/// Examples:
///   ghmail octocat
///   ghmail https://github.com/octocat/Hello-World --format json
///   ghmail octocat torvalds --max-repos 3
///   echo octocat | ghmail
///   ghmail --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub usernames or profile/repository URLs
    ///
    /// When omitted, inputs are read line by line from stdin. Piped input
    /// is resolved line by line; at a terminal a new line supersedes a
    /// lookup that is still running.
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL", env = "GHMAIL_API_URL")]
    pub api_url: Option<String>,

    /// Output format (text, json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Maximum number of repositories whose commits are scanned
    #[arg(long, value_name = "COUNT")]
    pub max_repos: Option<usize>,

    /// Maximum number of commits fetched per repository
    #[arg(long, value_name = "COUNT")]
    pub max_commits: Option<usize>,

    /// Cache entry lifetime in seconds
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Disable the lookup cache
    #[arg(long)]
    pub no_cache: bool,

    /// Location of the cache file
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Remove all cached lookups before doing anything else
    #[arg(long)]
    pub clear_cache: bool,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ghmail.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (results only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ghmail.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.max_repos == Some(0) {
            return Err("Max repos must be at least 1".to_string());
        }

        if self.max_commits == Some(0) {
            return Err("Max commits must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.cache_ttl == Some(0) && !self.no_cache {
            return Err("Cache TTL must be at least 1 second (or use --no-cache)".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    /// Pick the input source given whether stdin is a terminal.
    pub fn input_source(&self, stdin_is_terminal: bool) -> InputSource {
        if !self.inputs.is_empty() {
            InputSource::Arguments
        } else if stdin_is_terminal {
            InputSource::Interactive
        } else {
            InputSource::Piped
        }
    }
}

/// Read every non-blank line from `reader`, trimmed.
pub async fn read_inputs<R>(reader: R) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut inputs = Vec::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            inputs.push(line.to_string());
        }
    }
    Ok(inputs)
}
