use anyhow::{Context, Result};
use colored::*;
use shipwright_client::ShipwrightClient;

use crate::config::Config;

/// Check that the build server answers its health endpoint
pub async fn check(config: &Config) -> Result<()> {
    let client = ShipwrightClient::new(&config.server_url);

    let status = client
        .health()
        .await
        .with_context(|| format!("Build server at {} is not reachable", config.server_url))?;

    println!(
        "{} {} ({})",
        "✓".green().bold(),
        config.server_url.cyan(),
        status.trim().dimmed()
    );

    Ok(())
}
