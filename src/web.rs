use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{self, ApiState};
use crate::pipeline::CandidatePipeline;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn app(pipeline: Arc<CandidatePipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router())
        .with_state(ApiState { pipeline })
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

pub async fn run(pipeline: Arc<CandidatePipeline>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(pipeline))
        .await
        .context("Web server stopped unexpectedly")
}
