//! Profile and commit-email gathering.
//!
//! The only part of ghmail that performs I/O. Profile fetches may fail;
//! commit-email discovery never does: every sub-fetch yields a
//! [`SourceOutcome`] and failed ones simply contribute nothing.

use crate::cache::TtlCache;
use crate::errors::LookupError;
use crate::github::{GitHubClient, GitHubCommit, GitHubEvent, GitHubRepo};
use crate::models::{CommitEmailSet, Handle, ProfileRecord};
use tracing::{debug, info, warn};

/// Cache namespace for profile records.
pub const PROFILE_NAMESPACE: &str = "profile";

/// Cache namespace for commit email sets.
pub const EMAILS_NAMESPACE: &str = "emails";

/// Bounds on commit-history discovery.
///
/// Worst case is `2 + max_repos` requests per lookup for discovery
/// (events, repository list, one commit page per repository).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Repositories whose commit history is scanned.
    pub max_repos: usize,
    /// Commits requested per repository.
    pub max_commits_per_repo: usize,
    /// Size of the repository list page.
    pub repo_page_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_repos: 10,
            max_commits_per_repo: 10,
            repo_page_size: 30,
        }
    }
}

/// Result of one discovery sub-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Emails(Vec<String>),
    Skipped { source: String, reason: String },
}

impl SourceOutcome {
    fn skipped(source: impl Into<String>, reason: impl ToString) -> Self {
        SourceOutcome::Skipped {
            source: source.into(),
            reason: reason.to_string(),
        }
    }
}

/// Fold outcomes into an ordered email set, logging and ignoring failures.
pub fn fold_outcomes<I>(outcomes: I) -> CommitEmailSet
where
    I: IntoIterator<Item = SourceOutcome>,
{
    let mut set = CommitEmailSet::new();
    for outcome in outcomes {
        match outcome {
            SourceOutcome::Emails(emails) => set.extend(emails),
            SourceOutcome::Skipped { source, reason } => {
                warn!("Skipping {}: {}", source, reason);
            }
        }
    }
    set
}

/// Author emails from push events, in event order.
pub fn emails_from_events(events: &[GitHubEvent]) -> Vec<String> {
    events
        .iter()
        .filter(|event| event.is_push())
        .flat_map(|event| event.payload.commits.iter())
        .filter_map(|commit| commit.author.as_ref()?.email.clone())
        .collect()
}

/// Author emails from a commit list, in list order.
pub fn emails_from_commits(commits: &[GitHubCommit]) -> Vec<String> {
    commits
        .iter()
        .filter_map(|commit| commit.commit.author.as_ref()?.email.clone())
        .collect()
}

/// Pick the repositories to scan: non-forks if there are any, otherwise
/// everything, keeping recency order and at most `max` entries.
pub fn select_repos(repos: Vec<GitHubRepo>, max: usize) -> Vec<GitHubRepo> {
    let (sources, forks): (Vec<_>, Vec<_>) = repos.into_iter().partition(|repo| !repo.fork);
    let mut chosen = if sources.is_empty() { forks } else { sources };
    chosen.truncate(max);
    chosen
}

/// Issues the API calls for a lookup, behind a TTL cache.
#[derive(Clone)]
pub struct Aggregator {
    client: GitHubClient,
    cache: TtlCache,
    discovery: DiscoveryConfig,
}

impl Aggregator {
    pub fn new(client: GitHubClient, cache: TtlCache, discovery: DiscoveryConfig) -> Self {
        Self {
            client,
            cache,
            discovery,
        }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Fetch the profile for `handle`, from cache when possible.
    pub async fn fetch_profile(&self, handle: &Handle) -> Result<ProfileRecord, LookupError> {
        let key = TtlCache::key(PROFILE_NAMESPACE, &handle.key());
        if let Some(profile) = self.cache.get::<ProfileRecord>(&key) {
            debug!("Using cached profile for {}", handle);
            return Ok(profile);
        }

        info!("Fetching profile for {}", handle);
        let profile: ProfileRecord = self
            .client
            .get_user(handle.as_str())
            .await
            .map_err(|e| e.into_lookup(handle.as_str()))?
            .into();

        self.cache.set(&key, &profile);
        Ok(profile)
    }

    /// Discover real commit emails for `handle`. Never fails.
    pub async fn fetch_commit_emails(&self, handle: &Handle) -> CommitEmailSet {
        let key = TtlCache::key(EMAILS_NAMESPACE, &handle.key());
        if let Some(emails) = self.cache.get::<CommitEmailSet>(&key) {
            debug!("Using cached commit emails for {}", handle);
            return emails;
        }

        info!("Discovering commit emails for {}", handle);
        let mut outcomes = vec![self.events_source(handle).await];
        outcomes.extend(self.repository_sources(handle).await);

        let emails = fold_outcomes(outcomes);
        info!("Found {} commit email(s) for {}", emails.len(), handle);

        self.cache.set(&key, &emails);
        emails
    }

    async fn events_source(&self, handle: &Handle) -> SourceOutcome {
        match self.client.get_public_events(handle.as_str()).await {
            Ok(events) => SourceOutcome::Emails(emails_from_events(&events)),
            Err(e) => SourceOutcome::skipped("public events", e),
        }
    }

    /// One outcome for the repository list, or one per scanned repository.
    ///
    /// Repositories are scanned one after another, not in parallel.
    async fn repository_sources(&self, handle: &Handle) -> Vec<SourceOutcome> {
        let repos = match self
            .client
            .get_repos(handle.as_str(), self.discovery.repo_page_size)
            .await
        {
            Ok(repos) => repos,
            Err(e) => return vec![SourceOutcome::skipped("repository list", e)],
        };

        let selected = select_repos(repos, self.discovery.max_repos);
        debug!("Scanning {} repositories for {}", selected.len(), handle);

        let mut outcomes = Vec::with_capacity(selected.len());
        for repo in &selected {
            let outcome = match self
                .client
                .get_commits(
                    &repo.owner.login,
                    &repo.name,
                    handle.as_str(),
                    self.discovery.max_commits_per_repo,
                )
                .await
            {
                Ok(commits) => SourceOutcome::Emails(emails_from_commits(&commits)),
                Err(e) => {
                    SourceOutcome::skipped(format!("commits of {}/{}", repo.owner.login, repo.name), e)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
