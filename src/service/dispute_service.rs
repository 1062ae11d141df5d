//! Dispute service: admin listing, per-user history and status changes.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::backend::{Backend, Filter, Query, Table, decode_rows, fetch, fetch_one};
use crate::domain::timestamp::to_iso_millis;
use crate::domain::{Dispute, DisputeStatus, RecordId};
use crate::error::GatewayError;
use crate::monitoring::{DisputeFilter, DisputeSummary};

/// Notification category used for dispute updates.
pub const DISPUTE_NOTIFICATION_TYPE: &str = "dispute_update";

/// Requested change to a dispute.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DisputeUpdate {
    /// New handling state.
    pub status: DisputeStatus,
    /// Resolution note; required when resolving.
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Filtered disputes plus the summary over all of them.
#[derive(Debug, Clone)]
pub struct DisputeListing {
    /// Disputes passing the filter, newest first.
    pub disputes: Vec<Dispute>,
    /// Counts over every dispute, ignoring the filter.
    pub summary: DisputeSummary,
}

/// Orchestration layer for dispute handling.
#[derive(Debug, Clone)]
pub struct DisputeService {
    backend: Arc<dyn Backend>,
}

impl DisputeService {
    /// Creates a new `DisputeService`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Loads every dispute, applies `filter` and summarizes.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the read or decoding fails.
    pub async fn list(&self, filter: DisputeFilter) -> Result<DisputeListing, GatewayError> {
        let query = Query::table(Table::Disputes).order_by("created_at", false);
        let all: Vec<Dispute> = fetch(self.backend.as_ref(), &query).await?;
        let summary = DisputeSummary::from_disputes(&all);
        let disputes = all.into_iter().filter(|d| filter.matches(d)).collect();
        Ok(DisputeListing { disputes, summary })
    }

    /// Disputes the user filed or is named in, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the read or decoding fails.
    pub async fn for_user(&self, user_id: &RecordId) -> Result<Vec<Dispute>, GatewayError> {
        let query = Query::table(Table::Disputes)
            .or(vec![
                Filter::Eq("complainant_id".to_string(), user_id.to_json()),
                Filter::Eq("defendant_id".to_string(), user_id.to_json()),
            ])
            .order_by("created_at", false);
        fetch(self.backend.as_ref(), &query).await
    }

    /// Returns one dispute.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the id is unknown.
    pub async fn get(&self, id: &RecordId) -> Result<Dispute, GatewayError> {
        let query = Query::table(Table::Disputes).eq("id", id.to_json());
        fetch_one(self.backend.as_ref(), &query, id.as_str()).await
    }

    /// Moves a dispute to a new state and notifies both parties.
    ///
    /// Resolving or closing stamps `resolved_at`; reopening clears it.
    /// Notification failures are logged and do not undo the update.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::NotFound`] if the id is unknown.
    /// - [`GatewayError::Conflict`] if the dispute is already closed.
    /// - [`GatewayError::InvalidRequest`] if resolving without a resolution.
    pub async fn update_status(
        &self,
        id: &RecordId,
        update: DisputeUpdate,
    ) -> Result<Dispute, GatewayError> {
        let current = self.get(id).await?;
        if current.status == DisputeStatus::Closed {
            return Err(GatewayError::Conflict(format!("dispute {id} is closed")));
        }

        let resolution = update
            .resolution
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if update.status == DisputeStatus::Resolved && resolution.is_none() {
            return Err(GatewayError::InvalidRequest(
                "a resolution is required to resolve a dispute".to_string(),
            ));
        }

        let mut patch = json!({ "status": update.status.as_str() });
        if let Some(resolution) = &resolution {
            patch["resolution"] = json!(resolution);
        }
        patch["resolved_at"] = if update.status.is_settled() {
            json!(to_iso_millis(&Utc::now()))
        } else {
            serde_json::Value::Null
        };

        // Guarded write: a dispute closed since the read above must stay closed.
        let query = Query::table(Table::Disputes)
            .eq("id", id.to_json())
            .neq("status", DisputeStatus::Closed.as_str());
        let rows = self.backend.update(&query, patch).await?;
        let Some(updated) = decode_rows::<Dispute>(Table::Disputes, rows)?.into_iter().next() else {
            // Tell a concurrent close apart from a concurrent delete.
            self.get(id).await?;
            return Err(GatewayError::Conflict(format!("dispute {id} is closed")));
        };

        tracing::info!(%id, from = current.status.as_str(), to = updated.status.as_str(), "dispute status changed");
        self.notify_parties(&updated).await;
        Ok(updated)
    }

    async fn notify_parties(&self, dispute: &Dispute) {
        let parties = std::iter::once(&dispute.complainant_id).chain(dispute.defendant_id.as_ref());
        for user_id in parties {
            let row = json!({
                "user_id": user_id.as_str(),
                "title": "Dispute updated",
                "message": format!(
                    "Dispute \"{}\" is now {}.",
                    dispute.title,
                    dispute.status.as_str().replace('_', " ")
                ),
                "type": DISPUTE_NOTIFICATION_TYPE,
                "is_read": false,
            });
            if let Err(e) = self.backend.insert(Table::Notifications, row).await {
                tracing::warn!(dispute_id = %dispute.id, %user_id, error = %e, "dispute notification failed");
            }
        }
    }
}
