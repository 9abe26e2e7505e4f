//! Shipwright Builder
//!
//! The remote build pipeline behind the Shipwright service. Given an app
//! bundle it:
//!
//! 1. materializes a per-app workspace from the project template,
//! 2. writes the bundle's content packs and registers them as assets,
//! 3. dispatches a build to the CI system,
//! 4. tracks the resulting run until its artifact is available,
//! 5. returns the artifact reference together with a scannable code.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shipwright_builder::{BuildPipeline, GithubActionsClient, GithubConfig, PipelineConfig};
//! use shipwright_core::domain::bundle::AppBundle;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let github = GithubConfig::new("acme", "app-builds").with_token("ghp_...");
//!     let config = PipelineConfig::new("./template", "./apps").with_github(github);
//!     let ci = Arc::new(GithubActionsClient::new(&config.github)?);
//!     let pipeline = BuildPipeline::new(config, ci);
//!
//!     let bundle: AppBundle = serde_json::from_str(r#"{"app":{"id":"abc123"}}"#)?;
//!     let result = pipeline.generate_or_update_app(&bundle).await?;
//!     println!("{}", result.apk_url);
//!     Ok(())
//! }
//! ```

pub mod ci;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod finalizer;
pub mod locks;
pub mod packager;
pub mod pipeline;
pub mod tracker;
pub mod workspace;

// Re-export commonly used types
pub use ci::{CiClient, CiError, GithubActionsClient};
pub use config::{GithubConfig, PipelineConfig, TrackerConfig};
pub use error::{BuildError, Result};
pub use pipeline::BuildPipeline;
pub use tracker::BuildTracker;
