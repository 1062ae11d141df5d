//! Owned realtime subscriptions.
//!
//! A [`SubscriptionHandle`] is the only way to listen to one filtered
//! channel: it owns its broadcast receiver, so dropping the handle is the
//! unsubscribe. WebSocket connections that juggle several filters over one
//! receiver use a [`SubscriptionSet`] instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::backend::Table;
use crate::backend::query::json_eq;
use crate::domain::RowChange;

/// A table plus a single column equality, e.g. `messages.receiver_id = u-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFilter {
    /// Table to listen on.
    pub table: Table,
    /// Column compared against `value`.
    pub column: String,
    /// Expected column value.
    pub value: Value,
}

impl ChannelFilter {
    /// Creates a filter for `table.column = value`.
    #[must_use]
    pub fn new(table: Table, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            table,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `change` belongs to this channel.
    #[must_use]
    pub fn matches(&self, change: &RowChange) -> bool {
        change.table == self.table
            && change
                .column(&self.column)
                .is_some_and(|v| json_eq(v, &self.value))
    }
}

impl fmt::Display for ChannelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}={}", self.table, self.column, self.value)
    }
}

/// What a [`SubscriptionHandle`] yields.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// A change matching the filter.
    Change(RowChange),
    /// The handle fell behind the feed and `n` changes were dropped unseen.
    ///
    /// Any of them may have matched, so state derived from the channel must
    /// be re-read.
    Lagged(u64),
}

/// Receiving end of one filtered realtime channel.
///
/// Obtained from [`crate::domain::ChangeFeed::connect`].
#[derive(Debug)]
pub struct SubscriptionHandle {
    filter: ChannelFilter,
    receiver: Option<broadcast::Receiver<RowChange>>,
}

impl SubscriptionHandle {
    /// Wraps a raw feed receiver.
    #[must_use]
    pub const fn new(filter: ChannelFilter, receiver: broadcast::Receiver<RowChange>) -> Self {
        Self {
            filter,
            receiver: Some(receiver),
        }
    }

    /// Filter this handle listens with.
    #[must_use]
    pub const fn filter(&self) -> &ChannelFilter {
        &self.filter
    }

    /// Waits for the next matching change or a lag notice.
    ///
    /// Changes for other tables or values are skipped. Returns `None` once
    /// the handle is closed or the feed has shut down.
    pub async fn recv(&mut self) -> Option<Delivery> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Some(Delivery::Change(change)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, filter = %self.filter, "realtime subscriber lagged");
                    return Some(Delivery::Lagged(n));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Unsubscribes. Later calls to [`Self::recv`] return `None`.
    pub fn close(&mut self) {
        if self.receiver.take().is_some() {
            tracing::debug!(filter = %self.filter, "realtime channel closed");
        }
    }

    /// Whether the handle still holds its subscription.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Set of channel filters sharing one receiver (one WebSocket connection).
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    filters: Vec<ChannelFilter>,
}

impl SubscriptionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Returns `false` if it was already present.
    pub fn subscribe(&mut self, filter: ChannelFilter) -> bool {
        if self.filters.contains(&filter) {
            return false;
        }
        self.filters.push(filter);
        true
    }

    /// Removes a filter. Returns `false` if it was not present.
    pub fn unsubscribe(&mut self, filter: &ChannelFilter) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f != filter);
        self.filters.len() != before
    }

    /// Whether any filter matches `change`.
    #[must_use]
    pub fn matches(&self, change: &RowChange) -> bool {
        self.filters.iter().any(|f| f.matches(change))
    }

    /// Number of active filters.
    #[must_use]
    pub fn count(&self) -> usize {
        self.filters.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ChangeFeed, ChangeKind};
    use serde_json::json;

    fn message_to(receiver: &str) -> RowChange {
        RowChange::new(
            Table::Messages,
            ChangeKind::Insert,
            json!({"id": "m-1", "receiver_id": receiver, "is_read": false}),
        )
    }

    #[test]
    fn filter_requires_table_and_value() {
        let filter = ChannelFilter::new(Table::Messages, "receiver_id", "u-1");
        assert!(filter.matches(&message_to("u-1")));
        assert!(!filter.matches(&message_to("u-2")));

        let other_table = RowChange::new(
            Table::Notifications,
            ChangeKind::Insert,
            json!({"receiver_id": "u-1"}),
        );
        assert!(!filter.matches(&other_table));
    }

    #[test]
    fn filter_accepts_numeric_keys() {
        let filter = ChannelFilter::new(Table::Messages, "receiver_id", "7");
        let change = RowChange::new(Table::Messages, ChangeKind::Update, json!({"receiver_id": 7}));
        assert!(filter.matches(&change));
    }

    #[tokio::test]
    async fn handle_skips_unrelated_changes() {
        let feed = ChangeFeed::new(16);
        let mut handle = feed.connect(ChannelFilter::new(Table::Messages, "receiver_id", "u-1"));

        feed.publish(message_to("u-2"));
        feed.publish(message_to("u-1"));

        let Some(Delivery::Change(change)) = handle.recv().await else {
            panic!("expected a matching change");
        };
        assert_eq!(change.column("receiver_id"), Some(&json!("u-1")));
    }

    #[tokio::test]
    async fn handle_reports_dropped_changes() {
        let feed = ChangeFeed::new(1);
        let mut handle = feed.connect(ChannelFilter::new(Table::Messages, "receiver_id", "u-1"));

        feed.publish(message_to("u-1"));
        feed.publish(message_to("u-2"));

        let Some(Delivery::Lagged(n)) = handle.recv().await else {
            panic!("expected a lag notice");
        };
        assert_eq!(n, 1);
        assert!(handle.is_open());
    }

    #[tokio::test]
    async fn closed_handle_yields_none_and_unsubscribes() {
        let feed = ChangeFeed::new(16);
        let mut handle = feed.connect(ChannelFilter::new(Table::Messages, "receiver_id", "u-1"));
        assert_eq!(feed.receiver_count(), 1);

        handle.close();
        assert!(!handle.is_open());
        assert_eq!(feed.receiver_count(), 0);
        assert!(handle.recv().await.is_none());
    }

    #[test]
    fn set_subscribe_is_idempotent() {
        let mut set = SubscriptionSet::new();
        let filter = ChannelFilter::new(Table::Notifications, "user_id", "u-1");
        assert!(set.subscribe(filter.clone()));
        assert!(!set.subscribe(filter.clone()));
        assert_eq!(set.count(), 1);

        assert!(set.unsubscribe(&filter));
        assert!(!set.unsubscribe(&filter));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = SubscriptionSet::new();
        assert!(!set.matches(&message_to("u-1")));
    }
}
