//! Error types for the Shipwright client

use shipwright_core::dto::generate::ErrorBody;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Shipwright client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
        /// Pipeline error kind, when the server reported one
        kind: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
            kind: None,
        }
    }

    /// Create an API error from a raw response body
    ///
    /// Bodies in the server's `{"error", "kind"}` shape are decoded; anything
    /// else is kept verbatim as the message.
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(decoded) => Self::ApiError {
                status,
                message: decoded.error,
                kind: decoded.kind,
            },
            Err(_) => Self::api_error(status, body),
        }
    }

    /// Pipeline error kind reported by the server, if any
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::ApiError { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }

    /// Check if the server gave up waiting on the CI system
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind(),
            Some("run_discovery_timeout" | "run_timeout" | "artifact_not_found")
        )
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
