//! Wire types for the GitHub REST endpoints ghmail reads.
//!
//! Only the fields the lookup needs are modelled; everything else in the
//! payloads is ignored.

use crate::models::ProfileRecord;
use serde::{Deserialize, Serialize};

/// `GET /users/{handle}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<GitHubUser> for ProfileRecord {
    fn from(user: GitHubUser) -> Self {
        ProfileRecord {
            handle: user.login,
            display_name: non_blank(user.name),
            public_email: non_blank(user.email),
            numeric_id: user.id,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// An entry of `GET /users/{handle}/events/public`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: EventPayload,
}

impl GitHubEvent {
    pub fn is_push(&self) -> bool {
        self.kind == "PushEvent"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushCommit {
    pub author: Option<GitActor>,
}

/// Name/email pair of a git author or committer.
#[derive(Debug, Clone, Deserialize)]
pub struct GitActor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// An entry of `GET /users/{handle}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    pub owner: RepoOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// An entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: Option<GitActor>,
}
