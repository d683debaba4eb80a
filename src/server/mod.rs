// Server module
// HTTP boundary: exposes the query engine on a small JSON API

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::query::QueryEngine;
use crate::{KokobotError, Result};

/// Shared application state
pub struct AppState {
    pub engine: QueryEngine,
}

/// Chat request body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the vector store has been loaded into memory yet
    pub store_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
}

/// Build the router; separated from [`serve`] so tests can drive it with
/// `tower::ServiceExt::oneshot`
#[inline]
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/kokobot", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped
#[inline]
pub async fn serve(config: &ServerConfig, engine: QueryEngine) -> Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| KokobotError::Config(format!("Invalid bind address '{}': {}", config.bind, e)))?;

    let state = Arc::new(AppState { engine });
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

/// POST /api/kokobot - answer one question
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    info!("[{}] Incoming query ({} chars)", request_id, request.query.len());

    match state.engine.answer(&request.query).await {
        Ok(answer) => {
            info!("[{}] Answered with {} sources", request_id, answer.sources.len());
            (StatusCode::OK, Json(answer)).into_response()
        }
        Err(e) => {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("[{}] Query failed: {}", request_id, e);
            } else {
                warn!("[{}] Query rejected: {}", request_id, e);
            }
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = state.engine.loaded_record_count();
    Json(HealthResponse {
        status: "ok".to_string(),
        store_loaded: records.is_some(),
        records,
    })
}

/// Map domain errors onto HTTP status codes.
///
/// Client mistakes are 400, a missing store is 503 (retryable once the
/// indexer has run), upstream API failures are 502. An `InvalidInput` means
/// the scorer saw mismatched vector lengths, so it is a 500: the index is
/// corrupt, not the request.
fn error_status(error: &KokobotError) -> StatusCode {
    match error {
        KokobotError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        KokobotError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        KokobotError::EmbeddingService(_) | KokobotError::CompletionService(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
