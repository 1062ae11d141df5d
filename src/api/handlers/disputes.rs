//! Dispute handlers: admin list, detail, status change, per-user history.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{DisputeListResponse, PaginationParams, UserDisputesResponse};
use crate::app_state::AppState;
use crate::domain::{Dispute, RecordId};
use crate::error::{ErrorResponse, GatewayError};
use crate::monitoring::DisputeFilter;
use crate::service::DisputeUpdate;

/// `GET /admin/disputes` — List disputes with summary counts.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for unknown filter values, or
/// another [`GatewayError`] if the backend read fails.
#[utoipa::path(
    get,
    path = "/api/v1/admin/disputes",
    tag = "Disputes",
    summary = "List disputes",
    description = "Returns a page of disputes, optionally narrowed by status and priority, newest first. The summary always covers every dispute.",
    params(DisputeFilter, PaginationParams),
    responses(
        (status = 200, description = "Paginated dispute list", body = DisputeListResponse),
        (status = 400, description = "Unknown status or priority", body = ErrorResponse),
    )
)]
pub async fn list_disputes(
    State(state): State<AppState>,
    filter: Result<Query<DisputeFilter>, QueryRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(filter) = filter?;
    let Query(params) = params?;
    let listing = state.disputes.list(filter).await?;
    let (data, pagination) = params.paginate(listing.disputes);

    Ok(Json(DisputeListResponse {
        data,
        summary: listing.summary,
        pagination,
    }))
}

/// `GET /disputes/{id}` — Get one dispute.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the dispute does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/disputes/{id}",
    tag = "Disputes",
    summary = "Get dispute",
    params(("id" = String, Path, description = "Dispute ID")),
    responses(
        (status = 200, description = "Dispute details", body = Dispute),
        (status = 404, description = "Dispute not found", body = ErrorResponse),
    )
)]
pub async fn get_dispute(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let dispute = state.disputes.get(&RecordId::from(id)).await?;
    Ok(Json(dispute))
}

/// `PATCH /disputes/{id}` — Change a dispute's status.
///
/// # Errors
///
/// Returns [`GatewayError`] if the dispute is missing, closed, or being
/// resolved without a resolution.
#[utoipa::path(
    patch,
    path = "/api/v1/disputes/{id}",
    tag = "Disputes",
    summary = "Update dispute status",
    description = "Moves the dispute to a new status. Resolving requires a resolution note; resolving or closing stamps `resolved_at`. Closed disputes cannot change. Both parties receive a notification.",
    params(("id" = String, Path, description = "Dispute ID")),
    request_body = DisputeUpdate,
    responses(
        (status = 200, description = "Updated dispute", body = Dispute),
        (status = 400, description = "Missing resolution", body = ErrorResponse),
        (status = 404, description = "Dispute not found", body = ErrorResponse),
        (status = 409, description = "Dispute already closed", body = ErrorResponse),
    )
)]
pub async fn update_dispute(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<DisputeUpdate>,
) -> Result<impl IntoResponse, GatewayError> {
    let dispute = state
        .disputes
        .update_status(&RecordId::from(id), update)
        .await?;
    Ok(Json(dispute))
}

/// `GET /users/{id}/disputes` — Disputes a user filed or is named in.
///
/// # Errors
///
/// Returns [`GatewayError`] if the backend read fails.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/disputes",
    tag = "Disputes",
    summary = "User disputes",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Disputes split by role", body = UserDisputesResponse),
    )
)]
pub async fn user_disputes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = RecordId::from(id);
    let disputes = state.disputes.for_user(&user_id).await?;
    let (filed, against): (Vec<Dispute>, Vec<Dispute>) = disputes
        .into_iter()
        .partition(|d| d.complainant_id == user_id);

    Ok(Json(UserDisputesResponse { filed, against }))
}

/// Dispute routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/disputes", get(list_disputes))
        .route("/disputes/{id}", get(get_dispute).patch(update_dispute))
        .route("/users/{id}/disputes", get(user_disputes))
}
