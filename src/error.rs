//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3001,
///     "message": "backend query failed; please retry",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 409       |
/// | 2000–2999 | Not Found       | 404 Not Found               |
/// | 3000–3999 | Server/Backend  | 500 / 502                   |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested state change is not allowed for the record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A record with the given ID does not exist in the given table.
    #[error("{table} record not found: {id}")]
    NotFound {
        /// Table the lookup ran against.
        table: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The backend rejected or failed a query.
    #[error("backend query failed: {0}")]
    QueryFailed(String),

    /// A row returned by the backend did not match the expected shape.
    #[error("failed to decode {table} row: {reason}")]
    Decode {
        /// Table the row came from.
        table: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The system health source could not be read.
    #[error("health source unavailable: {0}")]
    HealthUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Conflict(_) => 1002,
            Self::NotFound { .. } => 2001,
            Self::Internal(_) => 3000,
            Self::QueryFailed(_) => 3001,
            Self::Decode { .. } => 3002,
            Self::HealthUnavailable(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::QueryFailed(_) | Self::HealthUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Decode { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to clients.
    ///
    /// Backend and decode failures are reported with a generic retry hint;
    /// the underlying cause only goes to the log.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::QueryFailed(_) | Self::Decode { .. } | Self::HealthUnavailable(_) => {
                "failed to load data from the backend; please retry".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
