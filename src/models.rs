//! Data models for ghmail.
//!
//! This module contains the records passed between the normalizer,
//! the lookup aggregator and the result synthesizer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain GitHub uses for generated, privacy-preserving commit emails.
pub const NOREPLY_DOMAIN: &str = "users.noreply.github.com";

/// Address GitHub uses for commits made through the web interface.
const WEB_FLOW_EMAIL: &str = "noreply@github.com";

/// A validated GitHub username.
///
/// Construct through [`crate::normalizer::normalize`] or
/// [`Handle::parse`]; the inner string always matches the username grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Wrap an already validated string.
    pub(crate) fn new_unchecked(value: impl Into<String>) -> Self {
        Handle(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for cache keys and comparisons.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Case-insensitive comparison, matching how GitHub treats usernames.
    pub fn eq_ignore_case(&self, other: &Handle) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user's public profile, as fetched once per lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Canonical login as reported by the platform.
    pub handle: String,
    /// Display name, if the user set one.
    pub display_name: Option<String>,
    /// Public profile email, if the user exposes it.
    pub public_email: Option<String>,
    /// Numeric account id.
    pub numeric_id: u64,
}

/// Returns true for GitHub generated or web-flow addresses.
pub fn is_noreply_email(email: &str) -> bool {
    let lower = email.to_ascii_lowercase();
    lower.contains(NOREPLY_DOMAIN) || lower == WEB_FLOW_EMAIL
}

/// Ordered, de-duplicated set of real commit emails.
///
/// Insertion order is preserved; noreply addresses are never admitted.
/// Deserialized values pass through the same filter as [`CommitEmailSet::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CommitEmailSet(Vec<String>);

impl CommitEmailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an email if it is real and not yet present.
    ///
    /// Returns true when the set changed.
    pub fn insert(&mut self, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() || is_noreply_email(email) {
            return false;
        }
        if self.0.iter().any(|e| e == email) {
            return false;
        }
        self.0.push(email.to_string());
        true
    }

    pub fn extend<I, S>(&mut self, emails: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for email in emails {
            self.insert(email.as_ref());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for CommitEmailSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CommitEmailSet::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<String>> for CommitEmailSet {
    fn from(emails: Vec<String>) -> Self {
        emails.into_iter().collect()
    }
}

impl From<CommitEmailSet> for Vec<String> {
    fn from(set: CommitEmailSet) -> Self {
        set.0
    }
}

/// Which heuristic produced the emails in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Discovered in push events or repository commit history.
    FoundInCommits,
    /// Taken from the public profile.
    FoundInProfile,
    /// Nothing found; a generated noreply address was synthesized.
    SyntheticNoreply,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::FoundInCommits => write!(f, "found in commits"),
            Provenance::FoundInProfile => write!(f, "found in profile"),
            Provenance::SyntheticNoreply => write!(f, "generated noreply address"),
        }
    }
}

/// Presentation-ready lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub display_name: String,
    /// Never empty, no duplicates, highest priority first.
    pub emails: Vec<String>,
    pub provenance: Provenance,
}

impl ResultRecord {
    /// The email to show first.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// `Name <email>` line as used in a git author field.
    pub fn author_line(&self) -> Option<String> {
        self.primary_email()
            .map(|email| format!("{} <{}>", self.display_name, email))
    }
}
