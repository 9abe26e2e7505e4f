//! Result finalizer
//!
//! Turns the artifact reference into a scannable code and assembles the
//! result handed back to the caller.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;
use shipwright_core::domain::pack::PackName;
use shipwright_core::domain::result::BuildResult;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{BuildError, Result};

const DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";
const QR_MIN_SIZE: u32 = 256;

/// Everything the finalizer needs besides the artifact reference
#[derive(Debug, Clone)]
pub struct FinalizeInput {
    pub build_id: Uuid,
    pub app_id: String,
    pub app_name: String,
    /// Whether the workspace was created by this run
    pub is_new: bool,
    pub packs: BTreeMap<PackName, PathBuf>,
}

/// Encodes `url` as a QR code embedded in an SVG `data:` URI
pub fn qr_code_data_url(url: &str) -> Result<String> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| BuildError::Encoding(format!("cannot encode {} as QR code: {}", url, e)))?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(image)))
}

/// Builds the final result for a successful run
pub fn finalize(artifact_url: &str, input: FinalizeInput) -> Result<BuildResult> {
    let qr_code_data_url = qr_code_data_url(artifact_url)?;

    let message = if input.is_new {
        "App generated successfully"
    } else {
        "App updated successfully"
    };

    Ok(BuildResult {
        build_id: input.build_id,
        success: true,
        message: message.to_string(),
        app_id: input.app_id,
        app_name: input.app_name,
        apk_url: artifact_url.to_string(),
        qr_code_data_url,
        ota_packs: input.packs,
    })
}
