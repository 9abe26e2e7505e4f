//! Build tracker
//!
//! Follows a dispatched build through the CI system in three sequential
//! phases, each with its own attempt budget:
//!
//! ```text
//! Discovering --active run--> WaitingCompletion --completed--> PollingArtifact --found--> Done
//!      |                             |                                |
//!      +--> Failed(RunDiscoveryTimeout)  +--> Failed(RunTimeout)      +--> Failed(ArtifactNotFound)
//! ```
//!
//! Phases 1 and 2 retry only against the absence of state: a CI request
//! error aborts tracking at once. Phase 3 treats a failed artifact listing
//! as a miss for that attempt.

pub mod poll;

pub use poll::{PollBudget, PollOutcome, poll_until};

use shipwright_core::domain::run::{Artifact, RemoteRun, RunStatus};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ci::CiClient;
use crate::config::TrackerConfig;
use crate::error::{BuildError, Result};

/// Position of a tracking run in the phase sequence
#[derive(Debug)]
pub enum TrackerState {
    Discovering,
    WaitingCompletion { run_id: u64 },
    PollingArtifact { run_id: u64 },
    Done { artifact_url: String },
    Failed(BuildError),
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerState::Discovering => write!(f, "discovering"),
            TrackerState::WaitingCompletion { run_id } => {
                write!(f, "waiting for run {} to complete", run_id)
            }
            TrackerState::PollingArtifact { run_id } => {
                write!(f, "polling artifacts of run {}", run_id)
            }
            TrackerState::Done { .. } => write!(f, "done"),
            TrackerState::Failed(e) => write!(f, "failed ({})", e.kind()),
        }
    }
}

/// Polling state machine over a CI client
pub struct BuildTracker {
    ci: Arc<dyn CiClient>,
    config: TrackerConfig,
}

impl BuildTracker {
    pub fn new(ci: Arc<dyn CiClient>, config: TrackerConfig) -> Self {
        Self { ci, config }
    }

    /// Tracks the build dispatched for `app_id` until its artifact is available
    ///
    /// # Returns
    /// A stable reference URL to the build artifact
    pub async fn track_build(&self, app_id: &str) -> Result<String> {
        let mut state = TrackerState::Discovering;

        loop {
            state = match state {
                TrackerState::Discovering => match self.discover_run(app_id).await {
                    Ok(run_id) => TrackerState::WaitingCompletion { run_id },
                    Err(e) => TrackerState::Failed(e),
                },
                TrackerState::WaitingCompletion { run_id } => {
                    match self.wait_for_completion(run_id).await {
                        Ok(()) => TrackerState::PollingArtifact { run_id },
                        Err(e) => TrackerState::Failed(e),
                    }
                }
                TrackerState::PollingArtifact { run_id } => {
                    match self.find_artifact(run_id).await {
                        Ok(artifact) => TrackerState::Done {
                            artifact_url: self.ci.artifact_url(run_id, artifact.id),
                        },
                        Err(e) => TrackerState::Failed(e),
                    }
                }
                TrackerState::Done { artifact_url } => return Ok(artifact_url),
                TrackerState::Failed(e) => return Err(e),
            };

            info!("Build tracker for app {}: {}", app_id, state);
        }
    }

    fn budget(&self, max_attempts: u32) -> PollBudget {
        PollBudget::new(self.config.poll_interval, max_attempts)
    }

    /// Phase 1: newest queued or in-progress run created by a dispatch
    async fn discover_run(&self, app_id: &str) -> Result<u64> {
        let outcome = poll_until(
            "run discovery",
            self.budget(self.config.discovery_attempts),
            || self.ci.list_runs(),
            |runs| {
                runs.into_iter()
                    .filter(|run| run.status.is_active() && self.belongs_to(run, app_id))
                    .max_by_key(|run| run.created_at)
                    .map(|run| run.id)
            },
        )
        .await?;

        match outcome {
            PollOutcome::Ready { value: run_id, attempts } => {
                info!("Discovered CI run {} after {} attempt(s)", run_id, attempts);
                Ok(run_id)
            }
            PollOutcome::Exhausted { attempts } => Err(BuildError::RunDiscoveryTimeout { attempts }),
        }
    }

    /// Whether a run can be attributed to the app being built
    fn belongs_to(&self, run: &RemoteRun, app_id: &str) -> bool {
        !self.config.correlate_by_app
            || run
                .display_title
                .as_deref()
                .is_some_and(|title| title.contains(app_id))
    }

    /// Phase 2: wait until the run reports `completed`
    async fn wait_for_completion(&self, run_id: u64) -> Result<()> {
        let outcome = poll_until(
            "run completion",
            self.budget(self.config.completion_attempts),
            || self.ci.get_run(run_id),
            |run| (run.status == RunStatus::Completed).then_some(run),
        )
        .await?;

        let run = match outcome {
            PollOutcome::Ready { value, .. } => value,
            PollOutcome::Exhausted { attempts } => {
                return Err(BuildError::RunTimeout { run_id, attempts });
            }
        };

        if run.is_failed() {
            let conclusion = run.conclusion.unwrap_or_default();
            if self.config.fail_on_failed_conclusion {
                return Err(BuildError::RunFailed { run_id, conclusion });
            }
            warn!(
                "CI run {} completed with conclusion '{}', looking for artifacts anyway",
                run_id, conclusion
            );
        }

        Ok(())
    }

    /// Phase 3: wait for the named artifact to show up on the run
    async fn find_artifact(&self, run_id: u64) -> Result<Artifact> {
        let name = self.config.artifact_name.as_str();

        let Ok(outcome) = poll_until(
            "artifact lookup",
            self.budget(self.config.artifact_attempts),
            || async move {
                match self.ci.list_artifacts(run_id).await {
                    Ok(artifacts) => Ok::<_, Infallible>(artifacts),
                    Err(e) => {
                        warn!("Failed to list artifacts of run {}: {}", run_id, e);
                        Ok(Vec::new())
                    }
                }
            },
            |artifacts| artifacts.into_iter().find(|a| a.name == name),
        )
        .await;

        match outcome {
            PollOutcome::Ready { value, attempts } => {
                info!(
                    "Artifact '{}' ({}) available on run {} after {} attempt(s)",
                    name, value.id, run_id, attempts
                );
                Ok(value)
            }
            PollOutcome::Exhausted { attempts } => Err(BuildError::ArtifactNotFound {
                run_id,
                name: name.to_string(),
                attempts,
            }),
        }
    }
}
