//! GitHub Actions implementation of the CI client
//!
//! Builds are triggered with a repository dispatch and observed through the
//! workflow runs and artifacts REST endpoints. Every request is
//! bearer-token authenticated when a token is configured.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use shipwright_core::domain::run::{Artifact, RemoteRun};
use tracing::debug;

use super::{CiClient, CiError, Result};
use crate::config::GithubConfig;

/// Event recorded on runs created by a repository dispatch
const DISPATCH_RUN_EVENT: &str = "repository_dispatch";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = concat!("shipwright-builder/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the GitHub Actions REST API
#[derive(Debug, Clone)]
pub struct GithubActionsClient {
    /// REST API base URL (e.g., "https://api.github.com")
    api_url: String,
    /// Web base URL used for artifact references
    web_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    workflow_runs: Vec<RemoteRun>,
}

#[derive(Debug, Deserialize)]
struct ArtifactsPage {
    artifacts: Vec<Artifact>,
}

impl GithubActionsClient {
    /// Create a new client from the GitHub settings
    ///
    /// Every request is bounded by `config.request_timeout`; a request that
    /// runs out of time fails with [`CiError::RequestFailed`].
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// The caller is responsible for configuring timeouts on `client`.
    pub fn with_client(config: &GithubConfig, client: Client) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            client,
        }
    }

    /// Base URL of the repository endpoints
    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.owner, self.repo)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(USER_AGENT, CLIENT_USER_AGENT);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CiError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| CiError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CiError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl CiClient for GithubActionsClient {
    async fn dispatch(&self, event_type: &str, payload: &JsonValue) -> Result<()> {
        if self.token.is_none() {
            return Err(CiError::MissingToken);
        }

        let url = format!("{}/dispatches", self.repo_url());
        let body = serde_json::json!({
            "event_type": event_type,
            "client_payload": payload,
        });

        debug!("Sending repository dispatch '{}' to {}", event_type, url);
        let response = self.request(Method::POST, &url).json(&body).send().await?;

        self.handle_empty_response(response).await
    }

    async fn list_runs(&self) -> Result<Vec<RemoteRun>> {
        let url = format!("{}/actions/runs", self.repo_url());
        let response = self
            .request(Method::GET, &url)
            .query(&[("event", DISPATCH_RUN_EVENT), ("per_page", "30")])
            .send()
            .await?;

        let page: WorkflowRunsPage = self.handle_response(response).await?;
        Ok(page.workflow_runs)
    }

    async fn get_run(&self, run_id: u64) -> Result<RemoteRun> {
        let url = format!("{}/actions/runs/{}", self.repo_url(), run_id);
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    async fn list_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>> {
        let url = format!("{}/actions/runs/{}/artifacts", self.repo_url(), run_id);
        let response = self.request(Method::GET, &url).send().await?;

        let page: ArtifactsPage = self.handle_response(response).await?;
        Ok(page.artifacts)
    }

    fn artifact_url(&self, run_id: u64, artifact_id: u64) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}/artifacts/{}",
            self.web_url, self.owner, self.repo, run_id, artifact_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shipwright_core::domain::run::RunStatus;

    fn config() -> GithubConfig {
        GithubConfig::new("acme", "app-builds")
    }

    #[test]
    fn test_urls() {
        let mut cfg = config();
        cfg.api_url = "https://api.github.com/".to_string();
        let client = GithubActionsClient::new(&cfg).unwrap();

        assert_eq!(client.repo_url(), "https://api.github.com/repos/acme/app-builds");
        assert_eq!(
            client.artifact_url(42, 7),
            "https://github.com/acme/app-builds/actions/runs/42/artifacts/7"
        );
    }

    #[test]
    fn test_empty_token_is_treated_as_missing() {
        let client = GithubActionsClient::new(&config().with_token("")).unwrap();
        assert!(client.token.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_without_token_fails_before_sending() {
        let client = GithubActionsClient::new(&config()).unwrap();
        let err = client
            .dispatch("build_app", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CiError::MissingToken));
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        // Connections are queued by the OS but never answered
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut cfg = config();
        cfg.api_url = format!("http://{}", listener.local_addr().unwrap());
        cfg.request_timeout = std::time::Duration::from_millis(100);
        let client = GithubActionsClient::new(&cfg).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), client.list_runs())
            .await
            .expect("request was not bounded by the client timeout");

        assert!(matches!(result, Err(CiError::RequestFailed(ref e)) if e.is_timeout()));
    }

    #[test]
    fn test_parse_workflow_runs_page() {
        let page: WorkflowRunsPage = serde_json::from_value(json!({
            "total_count": 2,
            "workflow_runs": [
                {
                    "id": 42,
                    "name": "Build",
                    "display_title": "abc123",
                    "status": "in_progress",
                    "conclusion": null,
                    "created_at": "2024-05-01T10:00:00Z",
                    "event": "repository_dispatch"
                },
                {
                    "id": 41,
                    "status": "completed",
                    "conclusion": "success",
                    "created_at": "2024-05-01T09:00:00Z"
                }
            ]
        }))
        .unwrap();

        assert_eq!(page.workflow_runs.len(), 2);
        assert_eq!(page.workflow_runs[0].status, RunStatus::InProgress);
        assert_eq!(page.workflow_runs[0].display_title.as_deref(), Some("abc123"));
        assert_eq!(page.workflow_runs[1].conclusion.as_deref(), Some("success"));
    }

    #[test]
    fn test_parse_artifacts_page() {
        let page: ArtifactsPage = serde_json::from_value(json!({
            "total_count": 1,
            "artifacts": [
                { "id": 7, "name": "flutter-apks", "size_in_bytes": 1024, "expired": false }
            ]
        }))
        .unwrap();

        assert_eq!(
            page.artifacts,
            vec![Artifact { id: 7, name: "flutter-apks".to_string() }]
        );
    }
}
