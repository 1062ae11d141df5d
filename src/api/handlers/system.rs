//! System endpoints: liveness and system health.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::analytics::SystemHealth;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    realtime_subscribers: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of open realtime receivers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            realtime_subscribers: state.feed.receiver_count(),
        }),
    )
}

/// `GET /system/health` — Uptime and response-time snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::HealthUnavailable`] if the source fails.
#[utoipa::path(
    get,
    path = "/system/health",
    tag = "System",
    summary = "System health",
    description = "Returns the snapshot reported by the configured health source. The built-in source reports configured placeholders and marks them approximate.",
    responses(
        (status = 200, description = "Health snapshot", body = SystemHealth),
        (status = 502, description = "Health source unavailable", body = ErrorResponse),
    )
)]
pub async fn system_health_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let health = state.analytics.system_health().await?;
    Ok(Json(health))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/system/health", get(system_health_handler))
}
