//! Router and shared state for the HTTP service.
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::config::{Config, PNG_NAME};
use crate::orchestrator::JobOrchestrator;

pub struct AppState {
    pub orchestrator: JobOrchestrator,
    pub repo_path: PathBuf,
    pub png_path: PathBuf,
    pub has_api_key: bool,
    pub has_secret_key: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        AppState::new(JobOrchestrator::from_config(config), config)
    }

    pub fn new(orchestrator: JobOrchestrator, config: &Config) -> Self {
        AppState {
            orchestrator,
            repo_path: config.repo_path.clone(),
            png_path: config.png_path(),
            has_api_key: config.credentials.has_api_key(),
            has_secret_key: config.credentials.has_secret_key(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/build-chart", post(handlers::build_chart))
        .route(&format!("/{}", PNG_NAME), get(handlers::serve_png))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
