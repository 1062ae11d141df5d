//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::analytics::{StaticHealthSource, SystemHealthSource};
use crate::backend::Backend;
use crate::config::GatewayConfig;
use crate::domain::ChangeFeed;
use crate::service::{AnalyticsService, DisputeService, NotificationService, VenueMonitorService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Data platform every service reads from.
    pub backend: Arc<dyn Backend>,
    /// Change feed for realtime subscriptions.
    pub feed: ChangeFeed,
    /// Admin analytics dashboard.
    pub analytics: Arc<AnalyticsService>,
    /// Dispute handling.
    pub disputes: Arc<DisputeService>,
    /// Venue status monitor.
    pub venues: Arc<VenueMonitorService>,
    /// Inbox counters and read receipts.
    pub notifications: Arc<NotificationService>,
    /// Quiet period for WebSocket unread watchers.
    pub unread_debounce: Duration,
}

impl AppState {
    /// Wires every service onto `backend` using the settings in `config`
    /// and the static health source.
    #[must_use]
    pub fn new(config: &GatewayConfig, backend: Arc<dyn Backend>, feed: ChangeFeed) -> Self {
        let health: Arc<dyn SystemHealthSource> = Arc::new(StaticHealthSource::from_config(config));
        Self::with_health(config, backend, feed, health)
    }

    /// Like [`AppState::new`] with a custom health source.
    #[must_use]
    pub fn with_health(
        config: &GatewayConfig,
        backend: Arc<dyn Backend>,
        feed: ChangeFeed,
        health: Arc<dyn SystemHealthSource>,
    ) -> Self {
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&backend),
            health,
            config.analytics_offset(),
            config.recent_activity_days,
        ));
        let disputes = Arc::new(DisputeService::new(Arc::clone(&backend)));
        let venues = Arc::new(VenueMonitorService::new(
            Arc::clone(&backend),
            config.venue_recent_booking_days,
        ));
        let notifications = Arc::new(NotificationService::new(Arc::clone(&backend)));

        Self {
            backend,
            feed,
            analytics,
            disputes,
            venues,
            notifications,
            unread_debounce: config.unread_debounce(),
        }
    }
}
