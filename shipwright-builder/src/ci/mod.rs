//! CI system layer
//!
//! The builder only needs four operations from the external CI system:
//! trigger a build, list recent runs, fetch one run and list a run's
//! artifacts. They are expressed as a trait so the tracker can be driven by
//! a scripted fake in tests.

mod error;
mod github;

pub use error::CiError;
pub use github::GithubActionsClient;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use shipwright_core::domain::run::{Artifact, RemoteRun};

/// Result type alias for CI operations
pub type Result<T> = std::result::Result<T, CiError>;

/// Client trait for the external CI system
#[async_trait]
pub trait CiClient: Send + Sync {
    /// Sends one trigger event carrying `payload`
    ///
    /// # Arguments
    /// * `event_type` - Event name the build workflow listens for
    /// * `payload` - Opaque data handed to the workflow
    async fn dispatch(&self, event_type: &str, payload: &JsonValue) -> Result<()>;

    /// Lists recent runs created by dispatch events, newest first
    async fn list_runs(&self) -> Result<Vec<RemoteRun>>;

    /// Fetches a single run by id
    async fn get_run(&self, run_id: u64) -> Result<RemoteRun>;

    /// Lists the artifacts attached to a run
    async fn list_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>>;

    /// Builds a stable reference to an artifact
    ///
    /// The reference points at the artifact page on the CI system; it is not
    /// a direct download of the artifact content.
    fn artifact_url(&self, run_id: u64, artifact_id: u64) -> String;
}
