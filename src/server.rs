//! HTTP server surface for the pipeline.
//!
//! Provides [`serve`]: wires the backends, cache, and resolver into a
//! [`ChatPipeline`] and exposes it over axum. Routes:
//!
//! - `POST /ask`       — run one question through the pipeline
//! - `GET  /healthz`   — liveness probe
//! - `GET  /cache/stats` — cache hit/miss counters

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend;
use crate::cache::{CacheStats, QueryCache};
use crate::config::{ConfigHandle, StocktalkConfig};
use crate::intent::IntentResolver;
use crate::pipeline::{ChatPipeline, Reply};
use crate::types::ChatMessage;

/// Shared setup: backends, cache, resolver, pipeline. Returns the pipeline
/// wrapped in Arc for sharing between handlers (and the CLI, which drives
/// the same pipeline without the HTTP layer).
pub fn build_pipeline(config: StocktalkConfig) -> Result<Arc<ChatPipeline>> {
    let backend = backend::create_backends(&config.backend)?;
    tracing::info!(base_url = %config.backend.base_url, "backend client ready");

    let cache = Arc::new(Mutex::new(QueryCache::new(
        config.cache.capacity,
        Duration::from_secs(config.cache.search_ttl_secs),
    )));

    let handle = ConfigHandle::new(config);
    let resolver = IntentResolver::new(
        backend.clone(),
        backend.clone(),
        cache.clone(),
        handle.clone(),
    );

    Ok(Arc::new(ChatPipeline::new(
        backend.clone(),
        backend,
        resolver,
        cache,
        handle,
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    session_id: Option<String>,
}

async fn ask(
    State(pipeline): State<Arc<ChatPipeline>>,
    Json(request): Json<AskRequest>,
) -> Json<Reply> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let reply = pipeline
        .answer(&request.message, &request.history, &session_id)
        .await;
    Json(reply)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn cache_stats(State(pipeline): State<Arc<ChatPipeline>>) -> Json<CacheStats> {
    Json(pipeline.cache_stats())
}

/// Start the HTTP server and block until ctrl-c.
pub async fn serve(config: StocktalkConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting stocktalk server");

    let pipeline = build_pipeline(config)?;

    let router = Router::new()
        .route("/ask", post(ask))
        .route("/healthz", get(healthz))
        .route("/cache/stats", get(cache_stats))
        .with_state(pipeline);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/ask");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down server");
        })
        .await?;

    Ok(())
}
