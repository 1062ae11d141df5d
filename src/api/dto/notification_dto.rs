//! DTOs for the inbox endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::RecordId;

/// Response for the mark-as-read endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    /// Rows that changed from unread to read.
    pub updated: usize,
}

/// Request body for `POST /users/{id}/messages/read`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkConversationReadRequest {
    /// Author whose messages were opened.
    pub sender_id: RecordId,
}
