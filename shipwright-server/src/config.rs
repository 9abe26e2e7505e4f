//! Server configuration
//!
//! Everything is read from environment variables. Optional values fall back
//! to the pipeline defaults; the template directory and the GitHub
//! repository coordinates are required.

use anyhow::Context;
use shipwright_builder::{GithubConfig, PipelineConfig, TrackerConfig};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_WORKING_ROOT: &str = "./apps";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Settings handed to the build pipeline
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SHIPWRIGHT_TEMPLATE_DIR (required)
    /// - GITHUB_OWNER, GITHUB_REPO (required)
    /// - GITHUB_TOKEN (optional, dispatches fail without it)
    /// - SHIPWRIGHT_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - SHIPWRIGHT_WORKING_ROOT (optional, default: ./apps)
    /// - SHIPWRIGHT_OTA_ROOT (optional, default: `ota` next to the working root)
    /// - SHIPWRIGHT_EVENT_TYPE (optional, default: build_app)
    /// - GITHUB_API_URL, GITHUB_WEB_URL (optional)
    /// - GITHUB_REQUEST_TIMEOUT (optional, seconds, default: 8)
    /// - POLL_INTERVAL (optional, seconds, default: 10)
    /// - DISCOVERY_ATTEMPTS, COMPLETION_ATTEMPTS, ARTIFACT_ATTEMPTS (optional)
    /// - ARTIFACT_NAME (optional, default: flutter-apks)
    /// - FAIL_ON_FAILED_CONCLUSION, CORRELATE_BY_APP (optional, default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", name))
        };

        let template_dir = required("SHIPWRIGHT_TEMPLATE_DIR")?;
        let working_root =
            var("SHIPWRIGHT_WORKING_ROOT").unwrap_or_else(|| DEFAULT_WORKING_ROOT.to_string());

        let mut github = GithubConfig::new(required("GITHUB_OWNER")?, required("GITHUB_REPO")?);
        if let Some(api_url) = var("GITHUB_API_URL") {
            github.api_url = api_url;
        }
        if let Some(web_url) = var("GITHUB_WEB_URL") {
            github.web_url = web_url;
        }
        github.token = var("GITHUB_TOKEN");
        if let Some(secs) = parse_var(&var, "GITHUB_REQUEST_TIMEOUT")? {
            github.request_timeout = Duration::from_secs(secs);
        }

        let defaults = TrackerConfig::default();
        let tracker = TrackerConfig {
            poll_interval: parse_var(&var, "POLL_INTERVAL")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            discovery_attempts: parse_var(&var, "DISCOVERY_ATTEMPTS")?
                .unwrap_or(defaults.discovery_attempts),
            completion_attempts: parse_var(&var, "COMPLETION_ATTEMPTS")?
                .unwrap_or(defaults.completion_attempts),
            artifact_attempts: parse_var(&var, "ARTIFACT_ATTEMPTS")?
                .unwrap_or(defaults.artifact_attempts),
            artifact_name: var("ARTIFACT_NAME").unwrap_or(defaults.artifact_name),
            fail_on_failed_conclusion: parse_var(&var, "FAIL_ON_FAILED_CONCLUSION")?
                .unwrap_or(defaults.fail_on_failed_conclusion),
            correlate_by_app: parse_var(&var, "CORRELATE_BY_APP")?
                .unwrap_or(defaults.correlate_by_app),
        };

        let mut pipeline = PipelineConfig::new(template_dir, working_root)
            .with_github(github)
            .with_tracker(tracker);
        if let Some(ota_root) = var("SHIPWRIGHT_OTA_ROOT") {
            pipeline = pipeline.with_ota_root(ota_root);
        }
        if let Some(event_type) = var("SHIPWRIGHT_EVENT_TYPE") {
            pipeline.event_type = event_type;
        }

        let config = Self {
            bind_addr: var("SHIPWRIGHT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            pipeline,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("invalid pipeline configuration")
    }
}

fn parse_var<T, V>(var: &V, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    V: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{} has an invalid value", name))
}
