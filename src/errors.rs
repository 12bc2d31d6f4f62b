//! Error types for ghmail.
//!
//! Each concern has its own error type derived with `thiserror`. Only
//! [`LookupError`] and [`ValidationError`] ever reach the caller of a lookup;
//! cache failures are logged and swallowed.

use thiserror::Error;

/// Maximum number of characters of a response body carried in user-facing text.
const MAX_MESSAGE_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// The raw input could not be turned into a valid handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing (or only whitespace) was entered.
    #[error("please enter a GitHub username or profile URL")]
    Empty,

    /// The candidate handle does not match the username grammar.
    #[error("'{0}' is not a valid GitHub username")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// Failures surfaced by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Bad handle syntax; no network call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The handle does not exist on the platform.
    #[error("no GitHub user named '{handle}'")]
    NotFound { handle: String },

    /// The anonymous API quota is exhausted.
    #[error("GitHub API rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<String> },

    /// Any other non-success status or network failure.
    #[error("GitHub request failed{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },
}

fn reset_suffix(reset_at: &Option<String>) -> String {
    match reset_at {
        Some(at) => format!(", resets at {}", at),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl LookupError {
    /// Build a transport error from a status and raw response text.
    ///
    /// The text is sanitized here so no caller can leak it unfiltered.
    pub fn transport(status: Option<u16>, message: impl AsRef<str>) -> Self {
        LookupError::Transport {
            status,
            message: sanitize_message(message.as_ref()),
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Validation(e) => sanitize_message(&e.to_string()),
            LookupError::NotFound { handle } => {
                format!("No GitHub user named '{}' was found.", sanitize_message(handle))
            }
            LookupError::RateLimited { .. } => {
                format!("{}. Please try again later.", self)
            }
            LookupError::Transport { .. } => sanitize_message(&self.to_string()),
        }
    }

    /// True for errors caused by the input rather than the platform.
    pub fn is_validation(&self) -> bool {
        matches!(self, LookupError::Validation(_))
    }
}

/// Strip control characters and markup-significant brackets, collapse
/// whitespace, and truncate.
pub fn sanitize_message(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| !matches!(c, '<' | '>'))
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = collapsed.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{}…", truncated)
    } else {
        collapsed
    }
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from individual GitHub REST API calls.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The requested resource does not exist.
    #[error("GitHub resource not found: {path}")]
    NotFound { path: String },

    /// The anonymous rate limit is exhausted.
    #[error("GitHub rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited { reset_at: Option<String> },

    /// Any other non-success status.
    #[error("GitHub API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Network, TLS, timeout or decode failure.
    #[error("GitHub HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GitHubError {
    /// Map an API failure for `handle` onto the lookup taxonomy.
    pub fn into_lookup(self, handle: &str) -> LookupError {
        match self {
            GitHubError::NotFound { .. } => LookupError::NotFound {
                handle: handle.to_string(),
            },
            GitHubError::RateLimited { reset_at } => LookupError::RateLimited { reset_at },
            GitHubError::Api { status, body } => LookupError::transport(Some(status), body),
            GitHubError::Http(e) => {
                LookupError::transport(e.status().map(|s| s.as_u16()), e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cache errors
// ---------------------------------------------------------------------------

/// Errors from the cache store. Never surfaced to lookup callers.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache entry could not be (de)serialized.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("failed to parse config file '{path}': {detail}")]
    Parse { path: String, detail: String },

    /// A config value is out of range.
    #[error("invalid configuration value for '{field}': {detail}")]
    Invalid { field: String, detail: String },
}
