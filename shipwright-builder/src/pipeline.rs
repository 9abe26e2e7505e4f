//! Pipeline orchestrator
//!
//! Runs the build stages strictly in order for one app:
//! materialize -> package -> dispatch -> track -> finalize.
//!
//! A failing stage is logged with its name and the app id and the error is
//! returned unchanged. Nothing is retried at this level; re-running the
//! whole pipeline after a failure is safe because materializing and
//! packaging are idempotent and every dispatch starts a fresh remote run.

use shipwright_core::domain::bundle::AppBundle;
use shipwright_core::domain::result::BuildResult;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::ci::CiClient;
use crate::config::PipelineConfig;
use crate::dispatcher::dispatch_build;
use crate::error::{BuildError, Result};
use crate::finalizer::{FinalizeInput, finalize};
use crate::locks::AppLocks;
use crate::packager;
use crate::tracker::BuildTracker;
use crate::workspace::{self, Workspace};

/// Named pipeline stage, used in failure logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Materialize,
    Package,
    Dispatch,
    Track,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Materialize => "materialize",
            Stage::Package => "package",
            Stage::Dispatch => "dispatch",
            Stage::Track => "track",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

fn log_failure(stage: Stage, app_id: &str) -> impl FnOnce(&BuildError) + '_ {
    move |e| {
        error!(
            "Build pipeline for app {} failed at {} stage ({}): {}",
            app_id,
            stage,
            e.kind(),
            e
        )
    }
}

/// The end-to-end build pipeline
pub struct BuildPipeline {
    config: PipelineConfig,
    ci: Arc<dyn CiClient>,
    tracker: BuildTracker,
    locks: AppLocks,
}

impl BuildPipeline {
    /// Creates a pipeline over the given CI client
    pub fn new(config: PipelineConfig, ci: Arc<dyn CiClient>) -> Self {
        let tracker = BuildTracker::new(Arc::clone(&ci), config.tracker.clone());
        Self {
            config,
            ci,
            tracker,
            locks: AppLocks::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds a new app or rebuilds an existing one
    ///
    /// The app id is taken from `bundle.app.id`. At most one pipeline runs
    /// per app at a time; a second call for the same app waits for the
    /// first to finish.
    pub async fn generate_or_update_app(&self, bundle: &AppBundle) -> Result<BuildResult> {
        let app_id = bundle
            .app_id()
            .ok_or_else(|| BuildError::InvalidAppId("bundle has no app.id".to_string()))?;
        let build_id = Uuid::new_v4();

        let span = info_span!("build", app_id = %app_id, build_id = %build_id);
        self.run(bundle, &app_id, build_id).instrument(span).await
    }

    async fn run(&self, bundle: &AppBundle, app_id: &str, build_id: Uuid) -> Result<BuildResult> {
        let _guard = self.locks.acquire(app_id).await;
        info!("Starting build pipeline for app {}", app_id);

        let workspace = self
            .materialize(app_id)
            .await
            .inspect_err(log_failure(Stage::Materialize, app_id))?;

        let packs = packager::write_packs(&workspace.dir, bundle)
            .await
            .inspect_err(log_failure(Stage::Package, app_id))?;

        dispatch_build(self.ci.as_ref(), &self.config.event_type, bundle)
            .await
            .inspect_err(log_failure(Stage::Dispatch, app_id))?;

        let artifact_url = self
            .tracker
            .track_build(app_id)
            .await
            .inspect_err(log_failure(Stage::Track, app_id))?;

        let result = finalize(
            &artifact_url,
            FinalizeInput {
                build_id,
                app_id: app_id.to_string(),
                app_name: bundle.app_name().unwrap_or(app_id).to_string(),
                is_new: workspace.is_new,
                packs,
            },
        )
        .inspect_err(log_failure(Stage::Finalize, app_id))?;

        info!("Build pipeline for app {} finished: {}", app_id, result.apk_url);
        Ok(result)
    }

    /// Writes a standalone OTA package for `app_id` without building
    ///
    /// # Returns
    /// The package directory holding the five pack files
    pub async fn build_ota_package(&self, app_id: &str, bundle: &AppBundle) -> Result<PathBuf> {
        workspace::validate_app_id(app_id)?;
        if let Some(bundle_id) = bundle.app_id().filter(|id| id != app_id) {
            return Err(BuildError::InvalidAppId(format!(
                "bundle belongs to app {}, not {}",
                bundle_id, app_id
            )));
        }

        let _guard = self.locks.acquire(app_id).await;

        let dir = self.config.ota_dir(app_id);
        packager::write_packs_to(&dir, bundle)
            .await
            .inspect_err(log_failure(Stage::Package, app_id))?;

        info!("OTA package for app {} written to {}", app_id, dir.display());
        Ok(dir)
    }

    /// Installs a previously built OTA package into the app's workspace
    ///
    /// The package must live under the OTA root, or be the workspace's own
    /// pack directory.
    ///
    /// # Returns
    /// The workspace directory
    pub async fn inject_ota(&self, app_id: &str, package_dir: &Path) -> Result<PathBuf> {
        workspace::validate_app_id(app_id)?;
        let package_dir = self
            .locate_package(app_id, package_dir)
            .await
            .inspect_err(log_failure(Stage::Package, app_id))?;
        let _guard = self.locks.acquire(app_id).await;

        let workspace = self
            .materialize(app_id)
            .await
            .inspect_err(log_failure(Stage::Materialize, app_id))?;

        packager::install_packs(&package_dir, &workspace.dir)
            .await
            .inspect_err(log_failure(Stage::Package, app_id))?;

        Ok(workspace.dir)
    }

    async fn locate_package(&self, app_id: &str, package_dir: &Path) -> Result<PathBuf> {
        let package = tokio::fs::canonicalize(package_dir).await.map_err(|e| {
            BuildError::Packaging(format!(
                "OTA package {} is not readable: {}",
                package_dir.display(),
                e
            ))
        })?;

        let ota_root = tokio::fs::canonicalize(&self.config.ota_root).await.ok();
        let own_packs = self.config.working_root.join(app_id).join(packager::PACKS_DIR);
        let own_packs = tokio::fs::canonicalize(own_packs).await.ok();

        let allowed = ota_root.is_some_and(|root| package.starts_with(root))
            || own_packs.is_some_and(|dir| package == dir);
        if !allowed {
            return Err(BuildError::Packaging(format!(
                "OTA package {} is outside the OTA root {}",
                package_dir.display(),
                self.config.ota_root.display()
            )));
        }
        Ok(package)
    }

    /// Runs the blocking template copy off the async executor
    async fn materialize(&self, app_id: &str) -> Result<Workspace> {
        let app_id = app_id.to_string();
        let template_dir = self.config.template_dir.clone();
        let working_root = self.config.working_root.clone();

        tokio::task::spawn_blocking(move || {
            workspace::ensure_workspace(&app_id, &template_dir, &working_root)
        })
        .await
        .map_err(|e| BuildError::io(&self.config.working_root, std::io::Error::other(e)))?
    }
}
