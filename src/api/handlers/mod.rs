//! REST endpoint handlers organized by resource.

pub mod analytics;
pub mod disputes;
pub mod notifications;
pub mod system;
pub mod venues;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(analytics::routes())
        .merge(disputes::routes())
        .merge(venues::routes())
        .merge(notifications::routes())
}
