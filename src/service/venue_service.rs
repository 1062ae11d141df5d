//! Venue monitor service: per-venue status indicators for admins.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::backend::{Backend, Query, Table, fetch};
use crate::domain::timestamp::to_iso_millis;
use crate::domain::{Booking, Venue, VenueField};
use crate::error::GatewayError;
use crate::monitoring::{VenueStatus, VenueStatusSummary, classify_venues};

/// Venue statuses plus summary counts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VenueStatusReport {
    /// Length of the recent-booking window, in days.
    pub window_days: i64,
    /// One entry per venue, in backend order.
    pub venues: Vec<VenueStatus>,
    /// Totals for the summary cards.
    pub summary: VenueStatusSummary,
}

/// Classifies venues from their fields and recent bookings.
#[derive(Debug, Clone)]
pub struct VenueMonitorService {
    backend: Arc<dyn Backend>,
    window_days: i64,
}

impl VenueMonitorService {
    /// Creates a new `VenueMonitorService` looking back `window_days`.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, window_days: i64) -> Self {
        Self {
            backend,
            window_days,
        }
    }

    /// Loads venues, fields and recent bookings concurrently and classifies
    /// every venue.
    ///
    /// # Errors
    ///
    /// Returns the first backend or decode failure.
    pub async fn status(&self) -> Result<VenueStatusReport, GatewayError> {
        let since = to_iso_millis(&(Utc::now() - Duration::days(self.window_days)));
        let venues = Query::table(Table::Venues).order_by("name", true);
        let fields = Query::table(Table::VenueFields).select(&["id", "venue_id", "name", "is_active"]);
        let bookings = Query::table(Table::Bookings).gte("created_at", since);

        let backend = self.backend.as_ref();
        let (venues, fields, bookings) = tokio::try_join!(
            fetch::<Venue>(backend, &venues),
            fetch::<VenueField>(backend, &fields),
            fetch::<Booking>(backend, &bookings),
        )?;

        let (venues, summary) = classify_venues(&venues, &fields, &bookings);
        tracing::debug!(total = summary.total, with_issues = summary.with_issues, "venue status computed");
        Ok(VenueStatusReport {
            window_days: self.window_days,
            venues,
            summary,
        })
    }
}
