//! Remote CI run domain types
//!
//! Runs and artifacts are owned by the external CI system; the builder only
//! observes them.

use serde::{Deserialize, Serialize};

/// A CI execution triggered by a build dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRun {
    pub id: u64,
    pub status: RunStatus,
    /// Outcome reported once the run is completed (`success`, `failure`, ...)
    #[serde(default)]
    pub conclusion: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Run title as rendered by the CI system
    #[serde(default)]
    pub display_title: Option<String>,
}

impl RemoteRun {
    /// Returns true if the run completed with a non-successful conclusion
    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Completed
            && self
                .conclusion
                .as_deref()
                .is_some_and(|c| c != "success")
    }
}

/// Run status as reported by the CI system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// Any status the builder does not track (`waiting`, `requested`, ...)
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// Queued or in progress
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

/// A named build output attached to a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
}
