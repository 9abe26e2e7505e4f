//! API Module
//!
//! HTTP API layer for the build service.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod generate;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use shipwright_builder::BuildPipeline;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BuildPipeline>,
}

impl AppState {
    pub fn new(pipeline: BuildPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Generate endpoints
        .route("/generate/app", post(generate::generate_app))
        .route("/generate/ota/{app_id}", post(generate::build_ota_package))
        .route("/generate/inject-ota", post(generate::inject_ota))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
