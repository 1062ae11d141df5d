//! Realtime change events for backend rows.
//!
//! Every write that goes through a [`crate::backend::Backend`] publishes a
//! [`RowChange`] on the [`super::ChangeFeed`]. Subscribers filter them by
//! table and a single column equality.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::Table;

/// Kind of row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// A single row mutation as delivered to realtime subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct RowChange {
    /// Table the row lives in.
    pub table: Table,
    /// What happened to the row.
    #[serde(rename = "event_type")]
    pub kind: ChangeKind,
    /// Row contents after the change (before it, for deletes).
    pub record: serde_json::Value,
    /// When the gateway observed the change.
    pub timestamp: DateTime<Utc>,
}

impl RowChange {
    /// Creates a change stamped with the current time.
    #[must_use]
    pub fn new(table: Table, kind: ChangeKind, record: serde_json::Value) -> Self {
        Self {
            table,
            kind,
            record,
            timestamp: Utc::now(),
        }
    }

    /// Returns the value of `column` in the changed row, if present.
    #[must_use]
    pub fn column(&self, column: &str) -> Option<&serde_json::Value> {
        self.record.get(column)
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self.kind {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_accessor_reads_record() {
        let change = RowChange::new(
            Table::Messages,
            ChangeKind::Insert,
            json!({"id": "m-1", "receiver_id": "u-1"}),
        );
        assert_eq!(change.column("receiver_id"), Some(&json!("u-1")));
        assert!(change.column("missing").is_none());
        assert_eq!(change.event_type_str(), "insert");
    }

    #[test]
    fn serializes_table_and_kind() {
        let change = RowChange::new(Table::Notifications, ChangeKind::Update, json!({}));
        let json_str = serde_json::to_string(&change).unwrap_or_default();
        assert!(json_str.contains("\"table\":\"notifications\""));
        assert!(json_str.contains("\"event_type\":\"UPDATE\""));
    }
}
