//! Shared test infrastructure for builder integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use shipwright_builder::ci::{CiClient, CiError, Result};
use shipwright_builder::config::{PipelineConfig, TrackerConfig};
use shipwright_core::domain::bundle::AppBundle;
use shipwright_core::domain::run::{Artifact, RemoteRun, RunStatus};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub const PUBSPEC: &str = "name: demo\ndescription: Demo app\n\nflutter:\n  uses-material-design: true\n";

/// Calls observed by a [`ScriptedCi`].
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub dispatches: Vec<(String, JsonValue)>,
    pub list_runs: u32,
    pub get_run: u32,
    pub list_artifacts: u32,
}

/// In-memory CI system following a fixed script.
///
/// Counts are "number of calls answered negatively before the positive
/// answer": with `discover_after = 3` the fourth listing shows the run.
pub struct ScriptedCi {
    pub run_id: u64,
    pub artifact: Artifact,
    pub discover_after: u32,
    pub complete_after: u32,
    pub artifact_after: u32,
    /// Listings answered with an error before the script continues
    pub artifact_errors: u32,
    pub conclusion: String,
    pub display_title: Option<String>,
    /// Always present in run listings, before the scripted run
    pub extra_runs: Vec<RemoteRun>,
    pub missing_token: bool,
    pub fail_run_listing: bool,
    pub fail_run_fetch: bool,
    calls: Mutex<Calls>,
}

impl ScriptedCi {
    pub fn new(run_id: u64, artifact_id: u64) -> Self {
        Self {
            run_id,
            artifact: Artifact {
                id: artifact_id,
                name: "flutter-apks".to_string(),
            },
            discover_after: 0,
            complete_after: 0,
            artifact_after: 0,
            artifact_errors: 0,
            conclusion: "success".to_string(),
            display_title: Some("Build app".to_string()),
            extra_runs: Vec::new(),
            missing_token: false,
            fail_run_listing: false,
            fail_run_fetch: false,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn discover_after(mut self, n: u32) -> Self {
        self.discover_after = n;
        self
    }

    pub fn never_discovered(self) -> Self {
        self.discover_after(u32::MAX)
    }

    pub fn complete_after(mut self, n: u32) -> Self {
        self.complete_after = n;
        self
    }

    pub fn artifact_after(mut self, n: u32) -> Self {
        self.artifact_after = n;
        self
    }

    pub fn artifact_errors(mut self, n: u32) -> Self {
        self.artifact_errors = n;
        self
    }

    pub fn conclusion(mut self, conclusion: &str) -> Self {
        self.conclusion = conclusion.to_string();
        self
    }

    pub fn display_title(mut self, title: &str) -> Self {
        self.display_title = Some(title.to_string());
        self
    }

    pub fn with_run(mut self, run: RemoteRun) -> Self {
        self.extra_runs.push(run);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

pub fn run(id: u64, status: RunStatus, minutes_ago: i64) -> RemoteRun {
    RemoteRun {
        id,
        status,
        conclusion: None,
        created_at: chrono::Utc::now() - chrono::Duration::minutes(minutes_ago),
        display_title: None,
    }
}

#[async_trait]
impl CiClient for ScriptedCi {
    async fn dispatch(&self, event_type: &str, payload: &JsonValue) -> Result<()> {
        if self.missing_token {
            return Err(CiError::MissingToken);
        }
        self.calls
            .lock()
            .unwrap()
            .dispatches
            .push((event_type.to_string(), payload.clone()));
        Ok(())
    }

    async fn list_runs(&self) -> Result<Vec<RemoteRun>> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.list_runs += 1;
            calls.list_runs
        };

        if self.fail_run_listing {
            return Err(CiError::api_error(500, "internal error"));
        }

        let mut runs = self.extra_runs.clone();
        if n > self.discover_after {
            runs.push(RemoteRun {
                display_title: self.display_title.clone(),
                ..run(self.run_id, RunStatus::Queued, 0)
            });
        }
        Ok(runs)
    }

    async fn get_run(&self, run_id: u64) -> Result<RemoteRun> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.get_run += 1;
            calls.get_run
        };

        if self.fail_run_fetch {
            return Err(CiError::api_error(500, "internal error"));
        }

        if n > self.complete_after {
            Ok(RemoteRun {
                conclusion: Some(self.conclusion.clone()),
                ..run(run_id, RunStatus::Completed, 0)
            })
        } else {
            Ok(run(run_id, RunStatus::InProgress, 0))
        }
    }

    async fn list_artifacts(&self, _run_id: u64) -> Result<Vec<Artifact>> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.list_artifacts += 1;
            calls.list_artifacts
        };

        if n <= self.artifact_errors {
            return Err(CiError::api_error(502, "bad gateway"));
        }

        let mut artifacts = vec![Artifact {
            id: 99,
            name: "build-logs".to_string(),
        }];
        if n > self.artifact_errors.saturating_add(self.artifact_after) {
            artifacts.push(self.artifact.clone());
        }
        Ok(artifacts)
    }

    fn artifact_url(&self, run_id: u64, artifact_id: u64) -> String {
        format!(
            "https://github.com/acme/app-builds/actions/runs/{}/artifacts/{}",
            run_id, artifact_id
        )
    }
}

/// Tracker settings with the default budgets and a 1ms poll interval
pub fn fast_tracker() -> TrackerConfig {
    TrackerConfig {
        poll_interval: Duration::from_millis(1),
        ..TrackerConfig::default()
    }
}

/// Template directory holding a single `pubspec.yaml`
pub fn template() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pubspec.yaml"), PUBSPEC).unwrap();
    dir
}

pub fn config(template: &TempDir, root: &TempDir) -> PipelineConfig {
    PipelineConfig::new(template.path(), root.path().join("apps"))
        .with_ota_root(root.path().join("ota"))
        .with_tracker(fast_tracker())
}

pub fn sample_bundle() -> AppBundle {
    serde_json::from_value(json!({
        "app": { "id": "abc123", "appName": "Demo" },
        "design": { "theme": "dark" },
        "layout": { "tabs": [] },
        "screens": [],
        "onboarding": []
    }))
    .unwrap()
}
