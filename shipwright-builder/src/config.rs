//! Pipeline configuration
//!
//! All paths, credentials and polling budgets are carried in an explicit
//! struct that is handed to the pipeline at construction. Nothing inside the
//! stages reads the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BuildError, Result};

/// Default repository-dispatch event type sent to the CI system
pub const DEFAULT_EVENT_TYPE: &str = "build_app";

/// Default name of the artifact holding the built packages
pub const DEFAULT_ARTIFACT_NAME: &str = "flutter-apks";

/// Directory name of the default OTA root, next to the working root
pub const DEFAULT_OTA_DIR: &str = "ota";

/// Default timeout of a single request to the CI system
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Build pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Read-only project template cloned into every new workspace
    pub template_dir: PathBuf,

    /// Directory holding one workspace per app id
    pub working_root: PathBuf,

    /// Directory holding standalone OTA packages, one per app id
    ///
    /// Must not overlap `working_root`, where every entry is an app workspace.
    pub ota_root: PathBuf,

    /// Event type attached to every build dispatch
    pub event_type: String,

    pub github: GithubConfig,

    pub tracker: TrackerConfig,
}

/// Connection settings for the GitHub Actions CI backend
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST API base URL (e.g., "https://api.github.com")
    pub api_url: String,

    /// Web base URL used to build artifact references
    pub web_url: String,

    /// Owner of the repository running the build workflow
    pub owner: String,

    /// Repository running the build workflow
    pub repo: String,

    /// Access token; dispatching fails without one
    pub token: Option<String>,

    /// Upper bound for one request, so a stalled call cannot stall a phase
    pub request_timeout: Duration,
}

/// Polling budgets for the three tracking phases
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between two attempts of any phase
    pub poll_interval: Duration,

    /// Attempts to find the run created by a dispatch
    pub discovery_attempts: u32,

    /// Attempts to see the discovered run complete
    pub completion_attempts: u32,

    /// Attempts to find the named artifact on the completed run
    pub artifact_attempts: u32,

    /// Name of the artifact to look for
    pub artifact_name: String,

    /// Stop as soon as a run completes with a non-successful conclusion
    pub fail_on_failed_conclusion: bool,

    /// Only accept runs whose title mentions the app id
    pub correlate_by_app: bool,
}

impl PipelineConfig {
    /// Creates a configuration with default budgets and GitHub endpoints
    pub fn new(template_dir: impl Into<PathBuf>, working_root: impl Into<PathBuf>) -> Self {
        let working_root = working_root.into();
        let ota_root = default_ota_root(&working_root);
        Self {
            template_dir: template_dir.into(),
            working_root,
            ota_root,
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            github: GithubConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }

    pub fn with_ota_root(mut self, ota_root: impl Into<PathBuf>) -> Self {
        self.ota_root = ota_root.into();
        self
    }

    pub fn with_github(mut self, github: GithubConfig) -> Self {
        self.github = github;
        self
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// Workspace directory for one app
    pub fn workspace_dir(&self, app_id: &str) -> PathBuf {
        self.working_root.join(app_id)
    }

    /// Standalone OTA package directory for one app
    pub fn ota_dir(&self, app_id: &str) -> PathBuf {
        self.ota_root.join(app_id)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.template_dir.as_os_str().is_empty() {
            return Err(BuildError::Configuration(
                "template_dir cannot be empty".to_string(),
            ));
        }

        if self.working_root.as_os_str().is_empty() {
            return Err(BuildError::Configuration(
                "working_root cannot be empty".to_string(),
            ));
        }

        if self.ota_root.as_os_str().is_empty() {
            return Err(BuildError::Configuration(
                "ota_root cannot be empty".to_string(),
            ));
        }

        if self.ota_root.starts_with(&self.working_root)
            || self.working_root.starts_with(&self.ota_root)
        {
            return Err(BuildError::Configuration(format!(
                "ota_root {} must not overlap working_root {}",
                self.ota_root.display(),
                self.working_root.display()
            )));
        }

        if self.event_type.trim().is_empty() {
            return Err(BuildError::Configuration(
                "event_type cannot be empty".to_string(),
            ));
        }

        self.github.validate()?;
        self.tracker.validate()
    }
}

impl GithubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, url) in [("api_url", &self.api_url), ("web_url", &self.web_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BuildError::Configuration(format!(
                    "github {} must start with http:// or https://",
                    name
                )));
            }
        }

        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(BuildError::Configuration(
                "github owner and repo must be set".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(BuildError::Configuration(
                "github request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            web_url: "https://github.com".to_string(),
            owner: String::new(),
            repo: String::new(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(BuildError::Configuration(
                "poll_interval must be greater than 0".to_string(),
            ));
        }

        if self.discovery_attempts == 0
            || self.completion_attempts == 0
            || self.artifact_attempts == 0
        {
            return Err(BuildError::Configuration(
                "polling budgets must allow at least one attempt".to_string(),
            ));
        }

        if self.artifact_name.trim().is_empty() {
            return Err(BuildError::Configuration(
                "artifact_name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            discovery_attempts: 30,
            completion_attempts: 60,
            artifact_attempts: 10,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            fail_on_failed_conclusion: false,
            correlate_by_app: false,
        }
    }
}

/// Sibling of the working root, so OTA packages never land inside a workspace
fn default_ota_root(working_root: &Path) -> PathBuf {
    working_root.with_file_name(DEFAULT_OTA_DIR)
}
