//! Broadcast channel for realtime row changes.
//!
//! [`ChangeFeed`] wraps a [`tokio::sync::broadcast`] channel. Backends
//! publish a [`RowChange`] after every write; consumers attach through
//! [`ChangeFeed::connect`], which hands back an owned
//! [`SubscriptionHandle`] filtered to one table and one equality predicate.

use tokio::sync::broadcast;

use super::RowChange;
use crate::realtime::{ChannelFilter, SubscriptionHandle};

/// Broadcast bus for [`RowChange`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest changes are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<RowChange>,
}

impl ChangeFeed {
    /// Creates a new `ChangeFeed` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a change to all subscribers.
    ///
    /// Returns the number of receivers that received the change.
    /// If there are no active receivers, the change is silently dropped.
    pub fn publish(&self, change: RowChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    /// Creates an unfiltered receiver for all future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RowChange> {
        self.sender.subscribe()
    }

    /// Opens a filtered subscription.
    ///
    /// The subscription lives exactly as long as the returned handle.
    #[must_use]
    pub fn connect(&self, filter: ChannelFilter) -> SubscriptionHandle {
        tracing::debug!(table = %filter.table, column = %filter.column, "realtime channel opened");
        SubscriptionHandle::new(filter, self.sender.subscribe())
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::backend::Table;
    use crate::domain::ChangeKind;
    use serde_json::json;

    fn make_change(receiver: &str) -> RowChange {
        RowChange::new(
            Table::Messages,
            ChangeKind::Insert,
            json!({"id": "m-1", "receiver_id": receiver}),
        )
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let feed = ChangeFeed::new(16);
        assert_eq!(feed.publish(make_change("u-1")), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_change() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.subscribe();
        feed.publish(make_change("u-1"));

        let Ok(change) = rx.recv().await else {
            panic!("expected to receive change");
        };
        assert_eq!(change.table, Table::Messages);
    }

    #[test]
    fn receiver_count_tracks_handles() {
        let feed = ChangeFeed::new(16);
        assert_eq!(feed.receiver_count(), 0);

        let handle = feed.connect(ChannelFilter::new(Table::Messages, "receiver_id", "u-1"));
        assert_eq!(feed.receiver_count(), 1);

        drop(handle);
        assert_eq!(feed.receiver_count(), 0);
    }
}
