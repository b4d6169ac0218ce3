use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    errors::ClassifiedError,
    response::render_success,
    state::AppState,
};

use super::dto::{HealthResponse, ScanRequest, ScanResponse};
use super::services::{scan_food, ScanLimits};

// --- public routers ---

pub fn scan_routes(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/nutrition/scan", post(scan))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
}

// --- handlers ---

/// POST /api/nutrition/scan { image_base64: "...", description?: "..." }
#[instrument(skip(state, payload), fields(scan_id = %uuid::Uuid::new_v4()))]
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScanResponse>), ClassifiedError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection, "malformed scan body");
        ClassifiedError::bad_request(rejection.body_text())
    })?;

    let limits = ScanLimits {
        max_image_bytes: state.config.max_image_bytes,
        timeout: state.config.inference.timeout,
    };
    let response = scan_food(state.analyzer.as_ref(), body, limits).await?;
    Ok(render_success(response))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
