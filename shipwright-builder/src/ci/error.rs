//! Error types for the CI client

use thiserror::Error;

/// Errors that can occur when talking to the CI system
#[derive(Debug, Error)]
pub enum CiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// CI system returned an error status code
    #[error("CI API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// No access token configured
    #[error("No CI access token configured")]
    MissingToken,
}

impl CiError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the CI system rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingToken)
            || matches!(self, Self::ApiError { status: 401 | 403, .. })
    }
}
