//! End-to-end username lookup.
//!
//! [`Resolver`] composes the normalizer, the [`Aggregator`] and the
//! synthesizer. The profile fetch and commit-email discovery run
//! concurrently; the result is produced once both have finished.
//!
//! Overlapping lookups are ordered with a generation counter: each lookup
//! takes a [`LookupTicket`], and a result is only rendered if no newer
//! lookup has started in the meantime.

pub mod aggregator;
pub mod synthesizer;

pub use aggregator::{
    Aggregator, DiscoveryConfig, SourceOutcome, EMAILS_NAMESPACE, PROFILE_NAMESPACE,
};
pub use synthesizer::{synthesize, synthetic_noreply};

use crate::errors::LookupError;
use crate::models::{Handle, ResultRecord};
use crate::normalizer::normalize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Marks one lookup's place in the sequence of lookups.
#[derive(Debug, Clone)]
pub struct LookupTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl LookupTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer lookup has been started.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

/// Runs lookups against a shared aggregator.
#[derive(Clone)]
pub struct Resolver {
    aggregator: Arc<Aggregator>,
    latest: Arc<AtomicU64>,
}

impl Resolver {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Start a new lookup generation, superseding all earlier tickets.
    pub fn begin(&self) -> LookupTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        LookupTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Look up an already validated handle.
    ///
    /// A profile error wins over whatever discovery found.
    pub async fn lookup(&self, handle: &Handle) -> Result<ResultRecord, LookupError> {
        let (profile, emails) = futures::join!(
            self.aggregator.fetch_profile(handle),
            self.aggregator.fetch_commit_emails(handle)
        );
        let profile = profile?;
        Ok(synthesize(&profile, &emails))
    }

    /// Normalize raw input and look it up. Invalid input makes no requests.
    pub async fn resolve(&self, raw_input: &str) -> Result<ResultRecord, LookupError> {
        let handle = normalize(raw_input)?;
        self.lookup(&handle).await
    }

    /// Resolve `raw_input` and hand the outcome to `render`, unless a newer
    /// lookup was started (with [`Resolver::begin`]) before this one finished.
    ///
    /// Returns whether `render` was called.
    pub async fn resolve_and_render<F>(
        &self,
        ticket: LookupTicket,
        raw_input: &str,
        render: F,
    ) -> bool
    where
        F: FnOnce(Result<ResultRecord, LookupError>),
    {
        let outcome = self.resolve(raw_input).await;

        if ticket.is_current() {
            render(outcome);
            true
        } else {
            debug!(
                "Discarding stale result for generation {}",
                ticket.generation()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::errors::ValidationError;
    use crate::github::{GitHubClient, DEFAULT_USER_AGENT};
    use crate::models::Provenance;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer) -> Resolver {
        resolver_for(&server.uri())
    }

    fn resolver_for(api_url: &str) -> Resolver {
        let client =
            GitHubClient::new(api_url, DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
        Resolver::new(Aggregator::new(
            client,
            TtlCache::in_memory(),
            DiscoveryConfig::default(),
        ))
    }

    async fn mount_profile(server: &MockServer, email: Option<&str>) {
        Mock::given(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": "octocat", "id": 583231, "name": null, "email": email
            })))
            .mount(server)
            .await;
    }

    async fn mount_events(server: &MockServer, body: serde_json::Value) {
        Mock::given(path("/users/octocat/events/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_no_repos(server: &MockServer) {
        Mock::given(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_email_found_in_push_event() {
        let server = MockServer::start().await;
        mount_profile(&server, None).await;
        mount_events(
            &server,
            json!([{"type": "PushEvent", "payload": {"commits": [
                {"author": {"name": "Octo", "email": "a@x.com"}}
            ]}}]),
        )
        .await;
        mount_no_repos(&server).await;

        let result = resolver(&server).resolve("octocat").await.unwrap();
        assert_eq!(result.emails, vec!["a@x.com"]);
        assert_eq!(result.provenance, Provenance::FoundInCommits);
        assert_eq!(result.display_name, "octocat");
    }

    #[tokio::test]
    async fn test_email_found_in_profile() {
        let server = MockServer::start().await;
        mount_profile(&server, Some("b@y.com")).await;
        mount_events(&server, json!([])).await;
        mount_no_repos(&server).await;

        let result = resolver(&server).resolve("octocat").await.unwrap();
        assert_eq!(result.emails, vec!["b@y.com"]);
        assert_eq!(result.provenance, Provenance::FoundInProfile);
    }

    #[tokio::test]
    async fn test_synthetic_noreply_when_nothing_found() {
        let server = MockServer::start().await;
        mount_profile(&server, None).await;
        mount_events(&server, json!([])).await;
        mount_no_repos(&server).await;

        let result = resolver(&server)
            .resolve("https://github.com/octocat")
            .await
            .unwrap();
        assert_eq!(
            result.emails,
            vec!["583231+octocat@users.noreply.github.com"]
        );
        assert_eq!(result.provenance, Provenance::SyntheticNoreply);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/users/ghost/events/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"type": "PushEvent", "payload": {"commits": [{"author": {"email": "a@x.com"}}]}}
            ])))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve("ghost").await.unwrap_err();
        assert_eq!(
            err,
            LookupError::NotFound {
                handle: "ghost".into()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        assert_eq!(
            resolver.resolve("   ").await.unwrap_err(),
            LookupError::Validation(ValidationError::Empty)
        );
        assert!(matches!(
            resolver.resolve("bad--name").await.unwrap_err(),
            LookupError::Validation(ValidationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_second_lookup_within_ttl_is_served_from_cache() {
        let server = MockServer::start().await;
        mount_profile(&server, None).await;
        mount_events(
            &server,
            json!([{"type": "PushEvent", "payload": {"commits": [
                {"author": {"email": "a@x.com"}}
            ]}}]),
        )
        .await;
        Mock::given(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Hello-World", "fork": false, "owner": {"login": "octocat"}}
            ])))
            .mount(&server)
            .await;
        Mock::given(path("/repos/octocat/Hello-World/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"commit": {"author": {"email": "c@z.com"}}}
            ])))
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        let first = resolver.resolve("octocat").await.unwrap();
        let requests_after_first = server.received_requests().await.unwrap().len();
        assert_eq!(requests_after_first, 4);

        let second = resolver.resolve("octocat").await.unwrap();
        let requests_after_second = server.received_requests().await.unwrap().len();

        assert_eq!(first, second);
        assert_eq!(requests_after_first, requests_after_second);
    }

    #[test]
    fn test_validation_happens_before_any_io() {
        // Nothing listens on the discard port; a request would fail as Transport.
        let resolver = resolver_for("http://127.0.0.1:9");
        let err = tokio_test::block_on(resolver.resolve("-leading")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let resolver = resolver_for("http://127.0.0.1:9");

        let first = resolver.begin();
        assert!(first.is_current());
        let second = resolver.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());
    }

    #[tokio::test]
    async fn test_stale_lookup_is_not_rendered() {
        let server = MockServer::start().await;
        Mock::given(path("/users/slowpoke"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(300))
                    .set_body_json(json!({"login": "slowpoke", "id": 1, "name": null, "email": null})),
            )
            .mount(&server)
            .await;
        mount_profile(&server, Some("b@y.com")).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        let rendered: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let slow = {
            let resolver = resolver.clone();
            let rendered = Arc::clone(&rendered);
            let ticket = resolver.begin();
            tokio::spawn(async move {
                resolver
                    .resolve_and_render(ticket, "slowpoke", |outcome| {
                        let record = outcome.unwrap();
                        rendered.lock().unwrap().push(record.display_name);
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let fast = resolver
            .resolve_and_render(resolver.begin(), "octocat", |outcome| {
                let record = outcome.unwrap();
                rendered.lock().unwrap().push(record.display_name);
            })
            .await;

        let slow = slow.await.unwrap();
        assert!(fast);
        assert!(!slow);
        assert_eq!(*rendered.lock().unwrap(), vec!["octocat".to_string()]);
    }
}
