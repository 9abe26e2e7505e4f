//! Error types for the build pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::ci::CiError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised by the build pipeline stages
///
/// Every stage returns one of these; the orchestrator logs and re-raises
/// them unchanged.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Missing template directory, invalid paths or settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No CI access token available
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// App identifier is missing or not usable as a directory name
    #[error("Invalid app id: {0}")]
    InvalidAppId(String),

    /// Bundle or OTA package could not be turned into content packs
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// The build trigger was rejected or never reached the CI system
    #[error("Dispatch failed: {0}")]
    Dispatch(#[source] CiError),

    /// A CI request failed while tracking a run
    #[error("CI request failed: {0}")]
    Ci(#[from] CiError),

    #[error("No active CI run discovered after {attempts} attempts")]
    RunDiscoveryTimeout { attempts: u32 },

    #[error("CI run {run_id} did not complete after {attempts} attempts")]
    RunTimeout { run_id: u64, attempts: u32 },

    /// Only raised when fail-fast on failing conclusions is enabled
    #[error("CI run {run_id} completed with conclusion '{conclusion}'")]
    RunFailed { run_id: u64, conclusion: String },

    #[error("Artifact '{name}' not found on CI run {run_id} after {attempts} attempts")]
    ArtifactNotFound {
        run_id: u64,
        name: String,
        attempts: u32,
    },

    /// The scannable code could not be produced
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error tagged with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Authentication(_) => "authentication_error",
            Self::InvalidAppId(_) => "invalid_app_id",
            Self::Packaging(_) => "packaging_error",
            Self::Dispatch(_) => "dispatch_error",
            Self::Ci(_) => "ci_error",
            Self::RunDiscoveryTimeout { .. } => "run_discovery_timeout",
            Self::RunTimeout { .. } => "run_timeout",
            Self::RunFailed { .. } => "run_failed",
            Self::ArtifactNotFound { .. } => "artifact_not_found",
            Self::Encoding(_) => "encoding_error",
            Self::Io { .. } => "io_error",
        }
    }

    /// Check if this error comes from an exhausted polling budget
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RunDiscoveryTimeout { .. } | Self::RunTimeout { .. } | Self::ArtifactNotFound { .. }
        )
    }
}
