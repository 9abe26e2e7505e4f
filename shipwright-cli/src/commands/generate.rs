//! Generate command handlers
//!
//! Full builds, standalone OTA packages and OTA injection.

use anyhow::{Context, Result};
use colored::*;
use shipwright_client::ShipwrightClient;
use shipwright_core::domain::bundle::AppBundle;
use shipwright_core::domain::result::BuildResult;
use std::path::Path;

use crate::config::Config;

/// Read and parse an app bundle file
pub fn load_bundle(path: &Path) -> Result<AppBundle> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse bundle file: {}", path.display()))
}

/// Build a new app or rebuild an existing one
pub async fn build_app(config: &Config, bundle_path: &Path) -> Result<()> {
    let bundle = load_bundle(bundle_path)?;
    let app_id = bundle
        .app_id()
        .context("Bundle has no app.id, the server would reject it")?;
    let client = ShipwrightClient::new(&config.server_url);

    println!(
        "{} {} {}",
        "Building app".bold(),
        app_id.cyan(),
        "(waiting for the CI run, this can take several minutes)".dimmed()
    );

    let result = client.generate_app(&bundle).await.map_err(|e| {
        if e.is_timeout() {
            anyhow::Error::new(e).context("The CI system did not deliver the build in time")
        } else {
            anyhow::Error::new(e).context("Build failed")
        }
    })?;

    print_build_result(&result);

    Ok(())
}

/// Write a standalone OTA package for an app
pub async fn build_ota(config: &Config, app_id: &str, bundle_path: &Path) -> Result<()> {
    let bundle = load_bundle(bundle_path)?;
    let client = ShipwrightClient::new(&config.server_url);

    let ota_path = client
        .build_ota(app_id, &bundle)
        .await
        .context("Failed to build OTA package")?;

    println!("{}", "✓ OTA package built successfully!".green().bold());
    println!("  App:  {}", app_id.cyan());
    println!("  Path: {}", ota_path.display().to_string().dimmed());

    Ok(())
}

/// Install an OTA package into the app workspace
pub async fn inject_ota(config: &Config, app_id: &str, ota_path: &Path) -> Result<()> {
    let client = ShipwrightClient::new(&config.server_url);

    let app_path = client
        .inject_ota(app_id, ota_path)
        .await
        .context("Failed to inject OTA package")?;

    println!("{}", "✓ OTA package injected successfully!".green().bold());
    println!("  App:       {}", app_id.cyan());
    println!("  Workspace: {}", app_path.display().to_string().dimmed());

    Ok(())
}

fn print_build_result(result: &BuildResult) {
    println!("{}", format!("✓ {}!", result.message).green().bold());
    println!("  App:      {} ({})", result.app_name.bold(), result.app_id.cyan());
    println!("  Build:    {}", result.build_id.to_string().dimmed());
    println!("  APK:      {}", result.apk_url.cyan());
    println!(
        "  QR code:  {}",
        format!("{} bytes data URL", result.qr_code_data_url.len()).dimmed()
    );
    if !result.ota_packs.is_empty() {
        println!("  Packs:");
        for (name, path) in &result.ota_packs {
            println!("    - {}: {}", name.to_string().cyan(), path.display().to_string().dimmed());
        }
    }
}
