//! Shared harness: seeds an in-memory backend and serves the full app on an
//! ephemeral port.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};

use bookplay_gateway::api::build_app;
use bookplay_gateway::app_state::AppState;
use bookplay_gateway::backend::{Backend, InMemoryBackend};
use bookplay_gateway::config::GatewayConfig;
use bookplay_gateway::domain::ChangeFeed;
use bookplay_gateway::domain::timestamp::to_iso_millis;

/// A running gateway.
pub struct TestApp {
    /// `http://127.0.0.1:<port>`
    pub base_url: String,
    /// `ws://127.0.0.1:<port>/ws`
    pub ws_url: String,
    /// Backend behind the server, for direct writes.
    pub backend: Arc<InMemoryBackend>,
}

fn days_ago(days: i64) -> String {
    to_iso_millis(&(Utc::now() - Duration::days(days)))
}

/// Marketplace fixture with recent activity relative to now.
pub fn fixture() -> Value {
    json!({
        "users": [
            {"id": "u-1", "name": "Ana", "email": "ana@bookplay.id", "created_at": days_ago(3), "user_type": "player"},
            {"id": "u-2", "name": "Budi", "email": "budi@bookplay.id", "created_at": days_ago(90), "user_type": "venue_owner"},
            {"id": "u-3", "name": "Citra", "email": "citra@bookplay.id", "created_at": days_ago(200), "user_type": "admin"}
        ],
        "venues": [
            {"id": "v-1", "name": "Arena Futsal", "created_at": days_ago(120), "approval_status": "approved", "owner_id": "u-2"},
            {"id": "v-2", "name": "Goal Box", "created_at": days_ago(20), "approval_status": "pending", "owner_id": "u-2"},
            {"id": "v-3", "name": "Old Court", "created_at": days_ago(300), "approval_status": "approved", "is_active": false}
        ],
        "venue_fields": [
            {"id": "f-1", "venue_id": "v-1", "name": "Pitch A", "is_active": true},
            {"id": "f-2", "venue_id": "v-2", "name": "Pitch B", "is_active": false}
        ],
        "bookings": [
            {"id": "b-1", "created_at": days_ago(2), "status": "confirmed", "total_amount": "150000",
             "venue_id": "v-1", "player_id": "u-1", "booking_date": "2024-03-10", "start_time": "19:00:00", "end_time": "20:00:00"},
            {"id": "b-2", "created_at": days_ago(4), "status": "cancelled", "total_amount": 100000,
             "venue_id": "v-1", "player_id": "u-1", "booking_date": "2024-03-11", "start_time": "20:00:00", "end_time": "21:00:00"}
        ],
        "disputes": [
            {"id": "d-1", "booking_id": "b-2", "title": "Late cancellation fee", "description": "Charged twice",
             "status": "open", "priority": "high", "complainant_id": "u-1", "defendant_id": "u-2", "created_at": days_ago(1)},
            {"id": "d-2", "title": "Broken net", "status": "closed", "priority": "low",
             "complainant_id": "u-2", "created_at": days_ago(10)}
        ],
        "messages": [
            {"id": "m-1", "sender_id": "u-2", "receiver_id": "u-1", "content": "See you at 7", "is_read": false, "created_at": days_ago(1)}
        ],
        "notifications": []
    })
}

/// Starts the gateway on `127.0.0.1:0` over a seeded memory backend.
pub async fn spawn_app(seed: Value) -> TestApp {
    let feed = ChangeFeed::new(256);
    let Ok(backend) = InMemoryBackend::from_seed(seed, feed.clone()) else {
        panic!("fixture should load");
    };
    let backend = Arc::new(backend);

    let config = GatewayConfig {
        unread_debounce_ms: 20,
        ..GatewayConfig::default()
    };
    let state = AppState::new(&config, Arc::clone(&backend) as Arc<dyn Backend>, feed);
    let app = build_app(state, config.request_timeout());

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind should succeed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has an address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestApp {
        base_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}/ws"),
        backend,
    }
}
