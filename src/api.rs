use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::db::DbHandle;
use crate::queue::JobQueue;
use crate::scan::producer;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub queue: Arc<dyn JobQueue>,
    pub max_batch: usize,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new().route(
        "/api/scanner",
        post(trigger_scan).fallback(method_not_allowed),
    )
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Sweep the catalog for stale templates and enqueue scan jobs for them.
/// The scan itself runs on the worker pool; the response only reports what
/// was enqueued.
async fn trigger_scan(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let jobs = producer::enqueue_stale(&state.db, state.queue.as_ref(), state.max_batch)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(serde_json::json!({
        "message": format!("{} jobs added", jobs.len()),
        "jobs": jobs,
    })))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({"error": "Method not allowed"})),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────
