//! Build result domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::pack::PackName;

/// Outcome of a successful build pipeline run
///
/// Constructed once at the end of a run and returned to the caller, who
/// decides whether to persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub build_id: Uuid,
    pub success: bool,
    pub message: String,
    pub app_id: String,
    pub app_name: String,
    /// Stable reference to the build artifact on the CI system
    pub apk_url: String,
    /// `data:` URI holding a scannable code for `apk_url`
    pub qr_code_data_url: String,
    pub ota_packs: BTreeMap<PackName, PathBuf>,
}
