//! Input normalization.
//!
//! Turns free-form input (a bare username, `@username`, a profile URL, a
//! repository URL or an SSH remote) into a validated [`Handle`]. Pure; no
//! network access.

use crate::errors::ValidationError;
use crate::models::Handle;
use reqwest::Url;

/// Hostname whose URLs are recognized as profile or repository links.
pub const PLATFORM_HOST: &str = "github.com";

/// Maximum length of a GitHub username.
pub const MAX_HANDLE_LEN: usize = 39;

/// Normalize raw user input into a validated handle.
pub fn normalize(raw_input: &str) -> Result<Handle, ValidationError> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let candidate = if trimmed.to_ascii_lowercase().contains(PLATFORM_HOST) {
        handle_from_url(trimmed)?
    } else {
        trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
    };

    Handle::parse(&candidate)
}

/// Extract the first non-empty path segment of a platform URL.
fn handle_from_url(input: &str) -> Result<String, ValidationError> {
    // git@github.com:owner/repo.git
    if let Some(rest) = input.strip_prefix("git@") {
        let path = rest.split_once(':').map(|(_, path)| path).unwrap_or("");
        return first_segment(path).ok_or_else(|| ValidationError::Malformed(input.to_string()));
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme).map_err(|_| ValidationError::Malformed(input.to_string()))?;

    first_segment(url.path()).ok_or_else(|| ValidationError::Malformed(input.to_string()))
}

fn first_segment(path: &str) -> Option<String> {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.trim_end_matches(".git").to_string())
}

impl Handle {
    /// Validate a candidate against the username grammar.
    ///
    /// Starts with an alphanumeric, contains only alphanumerics and single
    /// hyphens, each hyphen followed by an alphanumeric, at most 39 chars.
    pub fn parse(candidate: &str) -> Result<Handle, ValidationError> {
        if candidate.is_empty() {
            return Err(ValidationError::Empty);
        }
        if is_valid_handle(candidate) {
            Ok(Handle::new_unchecked(candidate))
        } else {
            Err(ValidationError::Malformed(candidate.to_string()))
        }
    }
}

fn is_valid_handle(candidate: &str) -> bool {
    if candidate.len() > MAX_HANDLE_LEN {
        return false;
    }

    let bytes = candidate.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphanumeric() => {}
        _ => return false,
    }

    bytes.iter().enumerate().all(|(i, b)| match b {
        b'-' => bytes.get(i + 1).is_some_and(|next| next.is_ascii_alphanumeric()),
        other => other.is_ascii_alphanumeric(),
    })
}
