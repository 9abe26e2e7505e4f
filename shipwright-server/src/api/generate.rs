//! Generate API Handlers
//!
//! HTTP endpoints that drive the build pipeline.

use axum::{
    Json,
    extract::{Path, State},
};
use shipwright_core::domain::bundle::AppBundle;
use shipwright_core::domain::result::BuildResult;
use shipwright_core::dto::generate::{InjectOtaRequest, InjectOtaResponse, OtaPackageResponse};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /generate/app
/// Build a new app or rebuild an existing one
pub async fn generate_app(
    State(state): State<AppState>,
    Json(bundle): Json<AppBundle>,
) -> ApiResult<Json<BuildResult>> {
    tracing::info!(
        "Generating app {}",
        bundle.app_id().as_deref().unwrap_or("<missing id>")
    );

    let result = state.pipeline.generate_or_update_app(&bundle).await?;

    Ok(Json(result))
}

/// POST /generate/ota/{app_id}
/// Write a standalone OTA package for an app
pub async fn build_ota_package(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    Json(bundle): Json<AppBundle>,
) -> ApiResult<Json<OtaPackageResponse>> {
    tracing::info!("Building OTA package for app {}", app_id);

    let ota_path = state.pipeline.build_ota_package(&app_id, &bundle).await?;

    Ok(Json(OtaPackageResponse { ota_path }))
}

/// POST /generate/inject-ota
/// Install a previously built OTA package into the app workspace
pub async fn inject_ota(
    State(state): State<AppState>,
    Json(req): Json<InjectOtaRequest>,
) -> ApiResult<Json<InjectOtaResponse>> {
    if req.ota_package_path.as_os_str().is_empty() {
        return Err(ApiError::BadRequest(
            "otaPackagePath cannot be empty".to_string(),
        ));
    }

    tracing::info!(
        "Injecting OTA package {} into app {}",
        req.ota_package_path.display(),
        req.app_id
    );

    let final_app_path = state
        .pipeline
        .inject_ota(&req.app_id, &req.ota_package_path)
        .await?;

    Ok(Json(InjectOtaResponse { final_app_path }))
}
