//! Live unread counters for one user.
//!
//! [`UnreadWatcher`] listens on the user's message and notification
//! channels. Each change re-arms a debounce timer; when it fires the counts
//! are fetched again and replace the previous value wholesale, so bursts of
//! changes cost a single round trip and overlapping deliveries are harmless.
//! A lag notice on either channel counts as a change, since the dropped
//! rows may have been the user's.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use utoipa::ToSchema;

use super::{ChannelFilter, SubscriptionHandle};
use crate::backend::{Backend, Query, Table};
use crate::domain::{ChangeFeed, RecordId};
use crate::error::GatewayError;

/// Default quiet period before unread counts are re-fetched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Unread items waiting for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UnreadCounts {
    /// Unread direct messages addressed to the user.
    pub messages: usize,
    /// Unread notifications for the user.
    pub notifications: usize,
}

impl UnreadCounts {
    /// Sum of both counters.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.messages + self.notifications
    }
}

/// Reads both unread counters concurrently.
///
/// # Errors
///
/// Returns the first backend failure.
pub async fn fetch_unread_counts(
    backend: &dyn Backend,
    user_id: &RecordId,
) -> Result<UnreadCounts, GatewayError> {
    let messages = Query::table(Table::Messages)
        .select(&["id"])
        .eq("receiver_id", user_id.to_json())
        .eq("is_read", false);
    let notifications = Query::table(Table::Notifications)
        .select(&["id"])
        .eq("user_id", user_id.to_json())
        .eq("is_read", false);

    let (messages, notifications) =
        tokio::try_join!(backend.select(&messages), backend.select(&notifications))?;

    Ok(UnreadCounts {
        messages: messages.len(),
        notifications: notifications.len(),
    })
}

/// Background task keeping [`UnreadCounts`] current for one user.
///
/// Dropping the watcher aborts the task, which drops its subscriptions.
#[derive(Debug)]
pub struct UnreadWatcher {
    user_id: RecordId,
    counts: watch::Receiver<UnreadCounts>,
    task: JoinHandle<()>,
}

impl UnreadWatcher {
    /// Subscribes to the user's channels and starts the refresh loop.
    ///
    /// The initial counts are fetched right away; until then the watcher
    /// reports zeros. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn(
        backend: Arc<dyn Backend>,
        feed: &ChangeFeed,
        user_id: RecordId,
        debounce: Duration,
    ) -> Self {
        let messages = feed.connect(ChannelFilter::new(
            Table::Messages,
            "receiver_id",
            user_id.to_json(),
        ));
        let notifications = feed.connect(ChannelFilter::new(
            Table::Notifications,
            "user_id",
            user_id.to_json(),
        ));
        let (tx, counts) = watch::channel(UnreadCounts::default());

        let task = tokio::spawn(watch_loop(
            backend,
            user_id.clone(),
            debounce,
            messages,
            notifications,
            tx,
        ));
        tracing::debug!(%user_id, "unread watcher started");

        Self {
            user_id,
            counts,
            task,
        }
    }

    /// User this watcher tracks.
    #[must_use]
    pub const fn user_id(&self) -> &RecordId {
        &self.user_id
    }

    /// Latest known counts.
    #[must_use]
    pub fn current(&self) -> UnreadCounts {
        *self.counts.borrow()
    }

    /// Waits until the counts are refreshed and returns them.
    ///
    /// Returns `None` if the refresh task has stopped.
    pub async fn changed(&mut self) -> Option<UnreadCounts> {
        self.counts.changed().await.ok()?;
        Some(*self.counts.borrow_and_update())
    }

    /// Returns a separate receiver of the counts.
    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<UnreadCounts> {
        self.counts.clone()
    }
}

impl Drop for UnreadWatcher {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(user_id = %self.user_id, "unread watcher stopped");
    }
}

async fn watch_loop(
    backend: Arc<dyn Backend>,
    user_id: RecordId,
    debounce: Duration,
    mut messages: SubscriptionHandle,
    mut notifications: SubscriptionHandle,
    tx: watch::Sender<UnreadCounts>,
) {
    refresh(backend.as_ref(), &user_id, &tx).await;

    let mut deadline: Option<Instant> = None;
    loop {
        let sleep_until = deadline.unwrap_or_else(Instant::now);
        tokio::select! {
            change = messages.recv() => match change {
                Some(_) => deadline = Some(Instant::now() + debounce),
                None => break,
            },
            change = notifications.recv() => match change {
                Some(_) => deadline = Some(Instant::now() + debounce),
                None => break,
            },
            () = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                deadline = None;
                refresh(backend.as_ref(), &user_id, &tx).await;
            }
        }
    }
}

async fn refresh(backend: &dyn Backend, user_id: &RecordId, tx: &watch::Sender<UnreadCounts>) {
    match fetch_unread_counts(backend, user_id).await {
        Ok(counts) => {
            tx.send_replace(counts);
        }
        Err(e) => tracing::warn!(%user_id, error = %e, "unread count refresh failed"),
    }
}
