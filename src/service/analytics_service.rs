//! Analytics service: loads the dashboard inputs and runs the pipeline.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::analytics::{
    AnalyticsInput, AnalyticsReport, MONTHLY_ACTIVE_DAYS, SystemHealth, SystemHealthSource, aggregate,
};
use crate::backend::{Backend, Query, Table, fetch};
use crate::domain::timestamp::to_iso_millis;
use crate::domain::{Booking, User, Venue};
use crate::error::GatewayError;

const USER_COLUMNS: &[&str] = &["id", "name", "email", "created_at", "user_type", "is_active"];
const VENUE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "created_at",
    "approval_status",
    "is_active",
    "owner_id",
];

/// Builds [`AnalyticsReport`]s for the admin dashboard.
///
/// All reads are issued concurrently; the first failure aborts the report.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    backend: Arc<dyn Backend>,
    health: Arc<dyn SystemHealthSource>,
    offset: FixedOffset,
    recent_activity_days: i64,
}

impl AnalyticsService {
    /// Creates a new `AnalyticsService`.
    ///
    /// Month and hour buckets are computed in `offset`; the recent-bookings
    /// read covers the trailing `recent_activity_days`, never less than
    /// [`MONTHLY_ACTIVE_DAYS`].
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        health: Arc<dyn SystemHealthSource>,
        offset: FixedOffset,
        recent_activity_days: i64,
    ) -> Self {
        Self {
            backend,
            health,
            offset,
            recent_activity_days: recent_activity_days.max(MONTHLY_ACTIVE_DAYS),
        }
    }

    /// Builds the report as of now.
    ///
    /// # Errors
    ///
    /// Returns the first backend, decode or health failure.
    pub async fn report(&self) -> Result<AnalyticsReport, GatewayError> {
        self.report_at(Utc::now().with_timezone(&self.offset)).await
    }

    /// Builds the report as of `now`.
    ///
    /// # Errors
    ///
    /// Returns the first backend, decode or health failure.
    pub async fn report_at(&self, now: DateTime<FixedOffset>) -> Result<AnalyticsReport, GatewayError> {
        let since = to_iso_millis(&(now - Duration::days(self.recent_activity_days)));

        let users = Query::table(Table::Users).select(USER_COLUMNS);
        let venues = Query::table(Table::Venues).select(VENUE_COLUMNS);
        let bookings = Query::table(Table::Bookings)
            .embed("venues", Table::Venues, "venue_id", &["name"])
            .embed("users", Table::Users, "player_id", &["name", "email"]);
        let recent = Query::table(Table::Bookings).gte("created_at", since);

        let backend = self.backend.as_ref();
        let (users, venues, bookings, recent_bookings, health) = tokio::try_join!(
            fetch::<User>(backend, &users),
            fetch::<Venue>(backend, &venues),
            fetch::<Booking>(backend, &bookings),
            fetch::<Booking>(backend, &recent),
            self.health.fetch_system_health(),
        )?;

        tracing::info!(
            users = users.len(),
            venues = venues.len(),
            bookings = bookings.len(),
            recent_bookings = recent_bookings.len(),
            "analytics inputs loaded"
        );

        let input = AnalyticsInput {
            users,
            venues,
            bookings,
            recent_bookings,
        };
        Ok(aggregate(&input, now, &health))
    }

    /// Returns the current system health snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HealthUnavailable`] if the source fails.
    pub async fn system_health(&self) -> Result<SystemHealth, GatewayError> {
        self.health.fetch_system_health().await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::analytics::StaticHealthSource;
    use crate::backend::InMemoryBackend;
    use crate::domain::ChangeFeed;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<FixedOffset> {
        let Some(now) = Utc
            .with_ymd_and_hms(2024, 3, 15, 12, 0, 0)
            .single()
            .map(|t| t.fixed_offset())
        else {
            panic!("valid instant");
        };
        now
    }

    fn service(seed: serde_json::Value, health: Arc<dyn SystemHealthSource>) -> AnalyticsService {
        service_with_window(seed, health, 30)
    }

    fn service_with_window(
        seed: serde_json::Value,
        health: Arc<dyn SystemHealthSource>,
        recent_activity_days: i64,
    ) -> AnalyticsService {
        let Ok(backend) = InMemoryBackend::from_seed(seed, ChangeFeed::new(8)) else {
            panic!("seed should load");
        };
        AnalyticsService::new(Arc::new(backend), health, *now().offset(), recent_activity_days)
    }

    fn seed() -> serde_json::Value {
        json!({
            "users": [
                {"id": "u-1", "name": "Ana", "email": "ana@x.io", "created_at": "2024-03-02T08:00:00.000Z", "user_type": "player"},
                {"id": "u-2", "name": "Ben", "email": "ben@x.io", "created_at": "2023-12-02T08:00:00.000Z", "user_type": "venue_owner"}
            ],
            "venues": [
                {"id": "v-1", "name": "Arena", "created_at": "2024-01-10T00:00:00.000Z", "approval_status": "approved", "owner_id": "u-2"}
            ],
            "bookings": [
                {"id": "b-1", "created_at": "2024-03-10T18:00:00.000Z", "status": "confirmed", "total_amount": "150000",
                 "venue_id": "v-1", "player_id": "u-1", "booking_date": "2024-03-10", "start_time": "18:00:00", "end_time": "19:00:00"},
                {"id": "b-2", "created_at": "2023-11-10T18:00:00.000Z", "status": "cancelled", "total_amount": 90000,
                 "venue_id": "v-1", "player_id": "u-1", "booking_date": "2023-11-10", "start_time": "18:00:00", "end_time": "19:00:00"}
            ]
        })
    }

    #[tokio::test]
    async fn report_joins_venue_names_and_recent_window() {
        let svc = service(seed(), Arc::new(StaticHealthSource::default()));
        let Ok(report) = svc.report_at(now()).await else {
            panic!("report should build");
        };

        assert_eq!(report.overview.total_users, 2);
        assert_eq!(report.overview.total_bookings, 2);
        assert_eq!(report.overview.confirmed_bookings, 1);
        assert!((report.overview.total_revenue - 150_000.0).abs() < f64::EPSILON);
        assert_eq!(report.top_venues.first().map(|v| v.name.as_str()), Some("Arena"));
        assert_eq!(report.top_users.first().map(|u| u.name.as_str()), Some("Ana"));
        // Only b-1 falls in the trailing 30 days.
        assert_eq!(report.engagement.monthly_active_users, 1);
        assert!(report.system.approximate);
    }

    #[tokio::test]
    async fn short_activity_window_still_covers_a_month() {
        let svc = service_with_window(seed(), Arc::new(StaticHealthSource::default()), 3);
        let Ok(report) = svc.report_at(now()).await else {
            panic!("report should build");
        };
        // b-1 is five days old.
        assert_eq!(report.engagement.monthly_active_users, 1);
        assert_eq!(report.engagement.weekly_active_users, 1);
    }

    #[derive(Debug)]
    struct FailingHealth;

    #[async_trait]
    impl SystemHealthSource for FailingHealth {
        async fn fetch_system_health(&self) -> Result<SystemHealth, GatewayError> {
            Err(GatewayError::HealthUnavailable("probe down".to_string()))
        }
    }

    #[tokio::test]
    async fn health_failure_fails_the_report() {
        let svc = service(seed(), Arc::new(FailingHealth));
        let Err(err) = svc.report_at(now()).await else {
            panic!("expected failure");
        };
        assert!(matches!(err, GatewayError::HealthUnavailable(_)));
    }

    #[tokio::test]
    async fn undecodable_rows_surface_as_decode_errors() {
        let mut bad = seed();
        bad["users"] = json!([{"id": "u-9", "created_at": "2024-01-01", "user_type": "robot"}]);
        let svc = service(bad, Arc::new(StaticHealthSource::default()));
        let Err(err) = svc.report_at(now()).await else {
            panic!("expected failure");
        };
        assert!(matches!(err, GatewayError::Decode { table: "users", .. }));
    }
}
