//! GitHub REST API access.
//!
//! A thin typed client over the four read-only endpoints the lookup uses.

pub mod client;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_URL, DEFAULT_USER_AGENT};
pub use types::{GitHubCommit, GitHubEvent, GitHubRepo, GitHubUser};
