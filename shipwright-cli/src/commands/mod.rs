//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod generate;
mod health;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build a new app or rebuild an existing one
    Build {
        /// Path to the app bundle JSON file
        #[arg(short, long)]
        bundle: PathBuf,
    },
    /// Write a standalone OTA package for an app
    Ota {
        /// App id
        app_id: String,

        /// Path to the app bundle JSON file
        #[arg(short, long)]
        bundle: PathBuf,
    },
    /// Install an OTA package into the app workspace
    Inject {
        /// App id
        app_id: String,

        /// OTA package directory on the server
        ota_path: PathBuf,
    },
    /// Check that the build server is reachable
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Build { bundle } => generate::build_app(config, &bundle).await,
        Commands::Ota { app_id, bundle } => generate::build_ota(config, &app_id, &bundle).await,
        Commands::Inject { app_id, ota_path } => {
            generate::inject_ota(config, &app_id, &ota_path).await
        }
        Commands::Health => health::check(config).await,
    }
}
