// file: src/server/mod.rs
// description: REST surface over the documentation pipeline
// reference: https://docs.rs/axum

pub mod error;

pub use error::ApiError;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::ingest::ProcessRequest;
use crate::models::DocumentationResult;
use crate::pipeline::{DocumentationPipeline, PipelineStats};
use crate::utils::HealthReport;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DocumentationPipeline>,
}

pub fn router(pipeline: Arc<DocumentationPipeline>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/process", post(process))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { pipeline })
}

async fn process(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProcessRequest>, JsonRejection>,
) -> std::result::Result<Json<DocumentationResult>, ApiError> {
    let Json(request) = payload?;
    info!("Received request with {} files", request.files.len());

    let result = state.pipeline.process(request.files).await?;
    info!(
        "Request {} documented {}/{} declarations",
        result.request_id, result.summary.documented, result.summary.declarations
    );
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.pipeline.health())
}

async fn stats(State(state): State<AppState>) -> Json<PipelineStats> {
    Json(state.pipeline.stats())
}

/// Serve until Ctrl-C, letting in-flight requests finish.
pub async fn serve(config: &Config, pipeline: Arc<DocumentationPipeline>) -> Result<()> {
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| PipelineError::Server(format!("Failed to bind {}: {}", address, e)))?;

    info!("Listening on http://{}", listener.local_addr()?);

    let app = router(pipeline, config.server.max_body_mb.saturating_mul(1024 * 1024));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PipelineError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
