//! Axum request handlers for the HTTP API.
use std::io::ErrorKind;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::commits::collect_last_week;
use crate::config::PNG_NAME;
use crate::error::AppResult;

pub async fn root() -> &'static str {
    "Commit Chart Server"
}

/// Repository presence and credential presence; never the secret values.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let repo_ok = tokio::fs::metadata(state.repo_path.join(".git"))
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    Json(json!({
        "repo_ok": repo_ok,
        "k_api": state.has_api_key,
        "k_secret": state.has_secret_key,
    }))
}

pub async fn build_chart(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match build(&state).await {
        Ok(()) => (StatusCode::OK, Json(json!({"ok": true, "path": format!("/{}", PNG_NAME)}))),
        Err(e) => {
            tracing::error!(error = %e, retryable = e.is_retryable(), "Chart build failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"ok": false, "error": e.to_string()})))
        }
    }
}

async fn build(state: &AppState) -> AppResult<()> {
    let week = collect_last_week(&state.repo_path).await?;
    let bytes = state.orchestrator.produce_image(&week).await?;
    tokio::fs::write(&state.png_path, &bytes).await?;
    tracing::info!(path = %state.png_path.display(), bytes = bytes.len(), "Chart written");
    Ok(())
}

pub async fn serve_png(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read(&state.png_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Chart has not been built yet").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read chart");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
