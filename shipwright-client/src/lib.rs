//! Shipwright HTTP Client
//!
//! A typed HTTP client for the Shipwright build service API, used by the
//! `shipwright` CLI.
//!
//! # Example
//!
//! ```no_run
//! use shipwright_client::ShipwrightClient;
//! use shipwright_core::domain::bundle::AppBundle;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ShipwrightClient::new("http://localhost:8080");
//!
//!     let bundle: AppBundle = serde_json::from_str(r#"{"app":{"id":"abc123"}}"#)?;
//!     let result = client.generate_app(&bundle).await?;
//!
//!     println!("APK: {}", result.apk_url);
//!     Ok(())
//! }
//! ```

pub mod error;
mod generate;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Shipwright build service
#[derive(Debug, Clone)]
pub struct ShipwrightClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ShipwrightClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// Full builds block until the CI run finishes, so callers driving
    /// `generate_app` should not configure a short request timeout.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_body(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is plain text
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_body(status.as_u16(), &text));
        }

        Ok(text)
    }
}
