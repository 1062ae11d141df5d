//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelFilter, UnreadCounts};
use crate::domain::{RecordId, RowChange};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an event with a fresh id.
    #[must_use]
    pub fn event(event: &WsEvent) -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            WsMessageType::Event,
            serde_json::to_value(event).unwrap_or_default(),
        )
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Serializes the message for the wire.
    #[must_use]
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client pushed event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Start forwarding row changes that match the filter.
    Subscribe(ChannelFilter),
    /// Stop forwarding row changes for the filter.
    Unsubscribe(ChannelFilter),
    /// Push live unread counts for a user. Replaces any previous watch.
    WatchUnread {
        /// User whose inbox is watched.
        user_id: RecordId,
    },
    /// Stop pushing unread counts.
    UnwatchUnread,
}

impl WsCommand {
    /// Wire names of every command.
    pub const NAMES: [&'static str; 4] =
        ["subscribe", "unsubscribe", "watch_unread", "unwatch_unread"];

    /// Whether `payload` names a known command, whatever its arguments.
    #[must_use]
    pub fn is_known(payload: &serde_json::Value) -> bool {
        payload
            .get("command")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|name| Self::NAMES.contains(&name))
    }
}

/// Events pushed by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WsEvent {
    /// A subscribed row changed.
    RowChange(RowChange),
    /// Fresh unread counts for the watched user.
    UnreadCounts {
        /// Watched user.
        user_id: RecordId,
        /// Counts after the latest refresh.
        counts: UnreadCounts,
    },
}
