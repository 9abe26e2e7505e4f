//! Generate endpoint DTOs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Response of `POST /generate/ota/{app_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaPackageResponse {
    pub ota_path: PathBuf,
}

/// Request body of `POST /generate/inject-ota`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectOtaRequest {
    pub app_id: String,
    pub ota_package_path: PathBuf,
}

/// Response of `POST /generate/inject-ota`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectOtaResponse {
    pub final_app_path: PathBuf,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
