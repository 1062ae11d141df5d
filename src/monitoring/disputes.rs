//! Dispute bucketing by status and priority.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Dispute, DisputePriority, DisputeStatus};

/// Optional status/priority narrowing for dispute lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DisputeFilter {
    /// Keep only disputes in this state.
    #[serde(default)]
    pub status: Option<DisputeStatus>,
    /// Keep only disputes with this priority.
    #[serde(default)]
    pub priority: Option<DisputePriority>,
}

impl DisputeFilter {
    /// Whether `dispute` passes the filter.
    #[must_use]
    pub fn matches(&self, dispute: &Dispute) -> bool {
        self.status.is_none_or(|s| dispute.status == s)
            && self.priority.is_none_or(|p| dispute.priority == p)
    }
}

/// Number of disputes in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    /// Dispute state.
    pub status: DisputeStatus,
    /// Disputes in that state.
    pub count: usize,
}

/// Number of disputes with one priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriorityCount {
    /// Dispute urgency.
    pub priority: DisputePriority,
    /// Disputes with that urgency.
    pub count: usize,
}

/// Counts for the dispute summary cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisputeSummary {
    /// All disputes considered.
    pub total: usize,
    /// Open or in-progress disputes.
    pub active: usize,
    /// Per-status counts, in lifecycle order.
    pub by_status: Vec<StatusCount>,
    /// Per-priority counts, lowest first.
    pub by_priority: Vec<PriorityCount>,
}

impl DisputeSummary {
    /// Buckets `disputes`; every status and priority is listed, even at 0.
    #[must_use]
    pub fn from_disputes(disputes: &[Dispute]) -> Self {
        let by_status = DisputeStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: disputes.iter().filter(|d| d.status == status).count(),
            })
            .collect();
        let by_priority = DisputePriority::ALL
            .into_iter()
            .map(|priority| PriorityCount {
                priority,
                count: disputes.iter().filter(|d| d.priority == priority).count(),
            })
            .collect();

        Self {
            total: disputes.len(),
            active: disputes.iter().filter(|d| !d.status.is_settled()).count(),
            by_status,
            by_priority,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn status_count(&self, status: DisputeStatus) -> usize {
        self.by_status
            .iter()
            .find(|b| b.status == status)
            .map_or(0, |b| b.count)
    }

    /// Count for one priority.
    #[must_use]
    pub fn priority_count(&self, priority: DisputePriority) -> usize {
        self.by_priority
            .iter()
            .find(|b| b.priority == priority)
            .map_or(0, |b| b.count)
    }
}
