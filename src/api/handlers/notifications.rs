//! Inbox handlers: unread counters, notification list and read receipts.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{MarkConversationReadRequest, MarkReadResponse};
use crate::app_state::AppState;
use crate::domain::{Notification, RecordId};
use crate::error::{ErrorResponse, GatewayError};
use crate::realtime::UnreadCounts;

/// `GET /users/{id}/unread` — Unread message and notification counts.
///
/// # Errors
///
/// Returns [`GatewayError`] if a backend read fails.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/unread",
    tag = "Inbox",
    summary = "Unread counts",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Unread counters", body = UnreadCounts),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn unread_counts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let counts = state.notifications.unread_counts(&RecordId::from(id)).await?;
    Ok(Json(counts))
}

/// `GET /users/{id}/notifications` — Latest notifications.
///
/// # Errors
///
/// Returns [`GatewayError`] if the backend read fails.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications",
    tag = "Inbox",
    summary = "Recent notifications",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Newest notifications first", body = Vec<Notification>),
    )
)]
pub async fn recent_notifications(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let notifications = state.notifications.recent(&RecordId::from(id)).await?;
    Ok(Json(notifications))
}

/// `POST /users/{id}/notifications/read` — Mark all notifications read.
///
/// # Errors
///
/// Returns [`GatewayError`] if the update fails.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/notifications/read",
    tag = "Inbox",
    summary = "Mark notifications read",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Rows updated", body = MarkReadResponse),
    )
)]
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let updated = state
        .notifications
        .mark_notifications_read(&RecordId::from(id))
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// `POST /users/{id}/messages/read` — Mark one conversation read.
///
/// # Errors
///
/// Returns [`GatewayError`] if the update fails.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/messages/read",
    tag = "Inbox",
    summary = "Mark conversation read",
    params(("id" = String, Path, description = "User ID")),
    request_body = MarkConversationReadRequest,
    responses(
        (status = 200, description = "Rows updated", body = MarkReadResponse),
    )
)]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MarkConversationReadRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let messages = state
        .notifications
        .mark_conversation_read(&RecordId::from(id), &req.sender_id)
        .await?;
    Ok(Json(MarkReadResponse {
        updated: messages.len(),
    }))
}

/// Inbox routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/unread", get(unread_counts))
        .route("/users/{id}/notifications", get(recent_notifications))
        .route("/users/{id}/notifications/read", post(mark_notifications_read))
        .route("/users/{id}/messages/read", post(mark_conversation_read))
}
