//! DTOs for the dispute endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::Dispute;
use crate::monitoring::DisputeSummary;

/// Response for `GET /admin/disputes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeListResponse {
    /// Page of disputes passing the filter, newest first.
    pub data: Vec<Dispute>,
    /// Counts over every dispute.
    pub summary: DisputeSummary,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response for `GET /users/{id}/disputes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDisputesResponse {
    /// Disputes the user filed.
    pub filed: Vec<Dispute>,
    /// Disputes filed against the user.
    pub against: Vec<Dispute>,
}
