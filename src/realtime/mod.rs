//! Realtime layer: owned channel subscriptions, live unread counters and
//! the WebSocket endpoint at `/ws`.
//!
//! Every subscription is an owned value. A [`SubscriptionHandle`] or an
//! [`UnreadWatcher`] unsubscribes when dropped, and a WebSocket connection
//! releases everything it opened when its loop ends.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
pub mod unread;

pub use subscription::{ChannelFilter, Delivery, SubscriptionHandle, SubscriptionSet};
pub use unread::{DEFAULT_DEBOUNCE, UnreadCounts, UnreadWatcher, fetch_unread_counts};
