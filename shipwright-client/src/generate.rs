//! Generate and health endpoints

use crate::ShipwrightClient;
use crate::error::Result;
use shipwright_core::domain::bundle::AppBundle;
use shipwright_core::domain::result::BuildResult;
use shipwright_core::dto::generate::{InjectOtaRequest, InjectOtaResponse, OtaPackageResponse};
use std::path::{Path, PathBuf};

impl ShipwrightClient {
    /// Check that the server is up
    ///
    /// # Returns
    /// The body of the health endpoint
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_text_response(response).await
    }

    /// Build a new app or rebuild an existing one
    ///
    /// Returns once the CI run has produced its artifact, which can take
    /// several minutes.
    pub async fn generate_app(&self, bundle: &AppBundle) -> Result<BuildResult> {
        let url = format!("{}/generate/app", self.base_url);
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(bundle).send().await?;

        self.handle_response(response).await
    }

    /// Write a standalone OTA package for an app
    ///
    /// # Returns
    /// The package directory on the server
    pub async fn build_ota(&self, app_id: &str, bundle: &AppBundle) -> Result<PathBuf> {
        let url = format!("{}/generate/ota/{}", self.base_url, app_id);
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(bundle).send().await?;

        let body: OtaPackageResponse = self.handle_response(response).await?;
        Ok(body.ota_path)
    }

    /// Install an OTA package into the app workspace
    ///
    /// # Arguments
    /// * `app_id` - The app whose workspace receives the packs
    /// * `ota_package_path` - Package directory on the server
    ///
    /// # Returns
    /// The workspace directory on the server
    pub async fn inject_ota(&self, app_id: &str, ota_package_path: &Path) -> Result<PathBuf> {
        let url = format!("{}/generate/inject-ota", self.base_url);
        let req = InjectOtaRequest {
            app_id: app_id.to_string(),
            ota_package_path: ota_package_path.to_path_buf(),
        };
        let response = self.client.post(&url).json(&req).send().await?;

        let body: InjectOtaResponse = self.handle_response(response).await?;
        Ok(body.final_app_path)
    }
}
