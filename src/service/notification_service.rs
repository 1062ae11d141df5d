//! Notification service: inbox counters and read receipts.

use std::sync::Arc;

use serde_json::json;

use crate::backend::{Backend, Query, Table, decode_rows, fetch};
use crate::domain::{Message, Notification, RecordId};
use crate::error::GatewayError;
use crate::realtime::{UnreadCounts, fetch_unread_counts};

/// Most notifications returned by [`NotificationService::recent`].
pub const RECENT_NOTIFICATIONS: usize = 50;

/// Reads and acknowledges a user's messages and notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    backend: Arc<dyn Backend>,
}

impl NotificationService {
    /// Creates a new `NotificationService`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Unread message and notification counts.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure.
    pub async fn unread_counts(&self, user_id: &RecordId) -> Result<UnreadCounts, GatewayError> {
        fetch_unread_counts(self.backend.as_ref(), user_id).await
    }

    /// Latest notifications for the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the read or decoding fails.
    pub async fn recent(&self, user_id: &RecordId) -> Result<Vec<Notification>, GatewayError> {
        let query = Query::table(Table::Notifications)
            .eq("user_id", user_id.to_json())
            .order_by("created_at", false)
            .limit(RECENT_NOTIFICATIONS);
        fetch(self.backend.as_ref(), &query).await
    }

    /// Marks every unread notification of the user as read.
    ///
    /// Returns how many rows changed.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the update fails.
    pub async fn mark_notifications_read(&self, user_id: &RecordId) -> Result<usize, GatewayError> {
        let query = Query::table(Table::Notifications)
            .eq("user_id", user_id.to_json())
            .eq("is_read", false);
        let rows = self.backend.update(&query, json!({ "is_read": true })).await?;
        tracing::debug!(%user_id, rows = rows.len(), "notifications marked read");
        Ok(rows.len())
    }

    /// Marks the messages `sender_id` sent to `user_id` as read.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the update or decoding fails.
    pub async fn mark_conversation_read(
        &self,
        user_id: &RecordId,
        sender_id: &RecordId,
    ) -> Result<Vec<Message>, GatewayError> {
        let query = Query::table(Table::Messages)
            .eq("receiver_id", user_id.to_json())
            .eq("sender_id", sender_id.to_json())
            .eq("is_read", false);
        let rows = self.backend.update(&query, json!({ "is_read": true })).await?;
        decode_rows(Table::Messages, rows)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::domain::ChangeFeed;

    fn service() -> NotificationService {
        let seed = json!({
            "messages": [
                {"id": "m-1", "sender_id": "u-2", "receiver_id": "u-1", "content": "a", "is_read": false, "created_at": "2024-03-01T10:00:00.000Z"},
                {"id": "m-2", "sender_id": "u-3", "receiver_id": "u-1", "content": "b", "is_read": false, "created_at": "2024-03-01T11:00:00.000Z"}
            ],
            "notifications": [
                {"id": "n-1", "user_id": "u-1", "title": "A", "message": "a", "type": "booking", "is_read": false, "created_at": "2024-03-01T10:00:00.000Z"},
                {"id": "n-2", "user_id": "u-1", "title": "B", "message": "b", "type": "booking", "is_read": false, "created_at": "2024-03-02T10:00:00.000Z"},
                {"id": "n-3", "user_id": "u-2", "title": "C", "message": "c", "type": "booking", "is_read": false, "created_at": "2024-03-03T10:00:00.000Z"}
            ]
        });
        let Ok(backend) = InMemoryBackend::from_seed(seed, ChangeFeed::new(8)) else {
            panic!("seed should load");
        };
        NotificationService::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn mark_read_resets_notification_count() {
        let svc = service();
        let user = RecordId::from("u-1");

        let Ok(before) = svc.unread_counts(&user).await else {
            panic!("counts should load");
        };
        assert_eq!(before.notifications, 2);

        assert_eq!(svc.mark_notifications_read(&user).await.unwrap_or_default(), 2);
        let Ok(after) = svc.unread_counts(&user).await else {
            panic!("counts should load");
        };
        assert_eq!(after.notifications, 0);
        assert_eq!(after.messages, 2);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_scoped() {
        let svc = service();
        let Ok(notes) = svc.recent(&RecordId::from("u-1")).await else {
            panic!("notifications should load");
        };
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n-2", "n-1"]);
    }

    #[tokio::test]
    async fn conversation_read_only_touches_one_sender() {
        let svc = service();
        let user = RecordId::from("u-1");
        let Ok(read) = svc.mark_conversation_read(&user, &RecordId::from("u-2")).await else {
            panic!("update should succeed");
        };
        assert_eq!(read.len(), 1);
        assert!(read.iter().all(|m| m.is_read));

        let Ok(counts) = svc.unread_counts(&user).await else {
            panic!("counts should load");
        };
        assert_eq!(counts.messages, 1);
    }
}
