//! Admin analytics dashboard handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::analytics::AnalyticsReport;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /admin/reports` — Build the analytics report.
///
/// # Errors
///
/// Returns [`GatewayError`] if any backend read or the health source fails.
#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    tag = "Analytics",
    summary = "Analytics report",
    description = "Aggregates users, venues and bookings into overview totals, six-month growth series, engagement, top users and venues, booking patterns and system metrics. All reads run concurrently and the first failure aborts the report.",
    responses(
        (status = 200, description = "Report computed", body = AnalyticsReport),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn get_report(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let report = state.analytics.report().await?;
    Ok(Json(report))
}

/// Analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/reports", get(get_report))
}
