use anyhow::Context;
use shipwright_builder::{BuildPipeline, GithubActionsClient};
use shipwright_server::api::{self, AppState};
use shipwright_server::config::ServerConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shipwright_server=info,shipwright_builder=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shipwright server...");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    if config.pipeline.github.token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set, build dispatches will be rejected");
    }

    tracing::info!(
        "Building against {}/{} from template {}",
        config.pipeline.github.owner,
        config.pipeline.github.repo,
        config.pipeline.template_dir.display()
    );

    let ci = Arc::new(
        GithubActionsClient::new(&config.pipeline.github)
            .context("Failed to create the GitHub Actions client")?,
    );
    let pipeline = BuildPipeline::new(config.pipeline, ci);

    // Build router with all API endpoints
    let app = api::create_router(AppState::new(pipeline));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
