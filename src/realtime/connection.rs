//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered row changes and
//! unread counters.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsEvent, WsMessage, WsMessageType};
use super::subscription::SubscriptionSet;
use super::unread::{UnreadCounts, UnreadWatcher};
use crate::app_state::AppState;
use crate::domain::RecordId;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards row changes matching the connection's filters.
/// - Pushes unread counts while a `watch_unread` is active.
///
/// All subscriptions are released when the loop ends.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut change_rx = state.feed.subscribe();
    let mut subs = SubscriptionSet::new();
    let mut unread: Option<UnreadWatcher> = None;

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &mut unread, &state);
                        if ws_tx.send(Message::text(reply.to_text())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Row change from the feed
            change = change_rx.recv() => {
                match change {
                    Ok(change) => {
                        if subs.matches(&change) {
                            let msg = WsMessage::event(&WsEvent::RowChange(change));
                            if ws_tx.send(Message::text(msg.to_text())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind change feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Refreshed unread counts
            update = next_unread(&mut unread) => {
                match update {
                    Some((user_id, counts)) => {
                        let msg = WsMessage::event(&WsEvent::UnreadCounts { user_id, counts });
                        if ws_tx.send(Message::text(msg.to_text())).await.is_err() {
                            break;
                        }
                    }
                    None => unread = None,
                }
            }
        }
    }

    tracing::debug!(subscriptions = subs.count(), "ws connection closed");
}

/// Waits for the active watcher's next refresh; never resolves without one.
async fn next_unread(unread: &mut Option<UnreadWatcher>) -> Option<(RecordId, UnreadCounts)> {
    match unread {
        Some(watcher) => {
            let counts = watcher.changed().await?;
            Some((watcher.user_id().clone(), counts))
        }
        None => std::future::pending().await,
    }
}

/// Handles a text message from the client and builds the reply.
fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionSet,
    unread: &mut Option<UnreadWatcher>,
    state: &AppState,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command message");
    }
    let known = WsCommand::is_known(&msg.payload);
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) if known => {
            return WsMessage::error(msg.id, 400, &format!("invalid command arguments: {e}"));
        }
        Err(_) => return WsMessage::error(msg.id, 404, "unknown command"),
    };

    let payload = match command {
        WsCommand::Subscribe(filter) => {
            let added = subs.subscribe(filter.clone());
            tracing::debug!(%filter, added, "ws subscribe");
            serde_json::json!({
                "subscribed": filter,
                "count": subs.count(),
            })
        }
        WsCommand::Unsubscribe(filter) => {
            let removed = subs.unsubscribe(&filter);
            serde_json::json!({
                "unsubscribed": filter,
                "removed": removed,
                "remaining_count": subs.count(),
            })
        }
        WsCommand::WatchUnread { user_id } => {
            // Replacing the watcher drops the old one and its channels.
            *unread = Some(UnreadWatcher::spawn(
                std::sync::Arc::clone(&state.backend),
                &state.feed,
                user_id.clone(),
                state.unread_debounce,
            ));
            serde_json::json!({ "watching_unread": user_id })
        }
        WsCommand::UnwatchUnread => {
            let stopped = unread.take().map(|w| w.user_id().clone());
            serde_json::json!({ "stopped": stopped })
        }
    };

    WsMessage::new(msg.id, WsMessageType::Response, payload)
}
