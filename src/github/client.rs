//! GitHub REST API client.
//!
//! Read-only and unauthenticated. Every call is a single page; pagination
//! is deliberately not followed.

use crate::errors::GitHubError;
use crate::github::types::{GitHubCommit, GitHubEvent, GitHubRepo, GitHubUser};
use chrono::{TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default `User-Agent` header; GitHub rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("ghmail/", env!("CARGO_PKG_VERSION"));

/// Asynchronous GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        debug!(api_url = %api_url, "created GitHubClient");
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET /users/{handle}`
    #[instrument(skip(self))]
    pub async fn get_user(&self, handle: &str) -> Result<GitHubUser, GitHubError> {
        self.get_json(&format!("/users/{}", handle), &[]).await
    }

    /// `GET /users/{handle}/events/public`, first page only.
    #[instrument(skip(self))]
    pub async fn get_public_events(&self, handle: &str) -> Result<Vec<GitHubEvent>, GitHubError> {
        self.get_json(&format!("/users/{}/events/public", handle), &[])
            .await
    }

    /// `GET /users/{handle}/repos`, most recently updated first.
    #[instrument(skip(self))]
    pub async fn get_repos(
        &self,
        handle: &str,
        per_page: usize,
    ) -> Result<Vec<GitHubRepo>, GitHubError> {
        let per_page = per_page.to_string();
        self.get_json(
            &format!("/users/{}/repos", handle),
            &[("sort", "updated"), ("per_page", per_page.as_str())],
        )
        .await
    }

    /// `GET /repos/{owner}/{repo}/commits` filtered by author.
    #[instrument(skip(self))]
    pub async fn get_commits(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
        per_page: usize,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let per_page = per_page.to_string();
        self.get_json(
            &format!("/repos/{}/{}/commits", owner, repo),
            &[("author", author), ("per_page", per_page.as_str())],
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);

        let resp = self.http.get(&url).query(query).send().await?;
        let resp = check_response(resp, path).await?;
        Ok(resp.json().await?)
    }
}

/// Classify a non-success response.
async fn check_response(resp: Response, path: &str) -> Result<Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound {
            path: path.to_string(),
        });
    }

    let remaining_exhausted = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    let reset_at = resp
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    let body = resp.text().await.unwrap_or_default();

    let limited_status = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
    if limited_status && (remaining_exhausted || body.to_ascii_lowercase().contains("rate limit")) {
        return Err(GitHubError::RateLimited { reset_at });
    }

    Err(GitHubError::Api {
        status: status.as_u16(),
        body: api_message(&body),
    })
}

/// Pull the `message` field out of a GitHub error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(server.uri(), DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_user_sends_api_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "login": "octocat", "id": 583231, "name": "The Octocat", "email": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server).get_user("octocat").await.unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.id, 583231);
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_user("ghost").await.unwrap_err();
        assert!(matches!(err, GitHubError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_by_message() {
        let server = MockServer::start().await;
        Mock::given(path("/users/octocat"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-reset", "1767225600")
                    .set_body_json(serde_json::json!({
                        "message": "API rate limit exceeded for 127.0.0.1."
                    })),
            )
            .mount(&server)
            .await;

        let err = client(&server).get_user("octocat").await.unwrap_err();
        match err {
            GitHubError::RateLimited { reset_at } => {
                assert_eq!(reset_at.as_deref(), Some("2026-01-01 00:00:00 UTC"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_by_header() {
        let server = MockServer::start().await;
        Mock::given(path("/users/octocat"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-ratelimit-remaining", "0")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let err = client(&server).get_user("octocat").await.unwrap_err();
        assert!(matches!(err, GitHubError::RateLimited { reset_at: None }));
    }

    #[tokio::test]
    async fn test_forbidden_without_rate_limit_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "message": "Repository access blocked"
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_user("octocat").await.unwrap_err();
        match err {
            GitHubError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Repository access blocked");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repos_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(path("/users/octocat/repos"))
            .and(query_param("sort", "updated"))
            .and(query_param("per_page", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Hello-World", "fork": false, "owner": {"login": "octocat"}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let repos = client(&server).get_repos("octocat", 30).await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].owner.login, "octocat");
    }

    #[tokio::test]
    async fn test_commits_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/octocat/Hello-World/commits"))
            .and(query_param("author", "octocat"))
            .and(query_param("per_page", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"sha": "abc", "commit": {"author": {"name": "Octo", "email": "a@x.com"}}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let commits = client(&server)
            .get_commits("octocat", "Hello-World", "octocat", 10)
            .await
            .unwrap();
        assert_eq!(
            commits[0]
                .commit
                .author
                .as_ref()
                .and_then(|a| a.email.as_deref()),
            Some("a@x.com")
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).get_user("octocat").await.unwrap_err();
        assert!(matches!(err, GitHubError::Http(_)));
    }

    #[test]
    fn test_api_message_extraction() {
        assert_eq!(api_message(r#"{"message":"Bad credentials"}"#), "Bad credentials");
        assert_eq!(api_message("plain text"), "plain text");
    }
}
