//! Venue status monitor handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::VenueStatusReport;

/// `GET /admin/venues/status` — Per-venue issue indicators.
///
/// # Errors
///
/// Returns [`GatewayError`] if a backend read fails.
#[utoipa::path(
    get,
    path = "/api/v1/admin/venues/status",
    tag = "Venues",
    summary = "Venue status monitor",
    description = "Classifies every venue as closed, without active fields, without recent bookings, or healthy, first match wins.",
    responses(
        (status = 200, description = "Venue statuses and summary", body = VenueStatusReport),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn venue_status(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let report = state.venues.status().await?;
    Ok(Json(report))
}

/// Venue routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/venues/status", get(venue_status))
}
