//! Venue health indicators for the admin status monitor.
//!
//! Each venue gets exactly one [`VenueIssue`], picked by the first rule that
//! applies: closed, then no active fields, then no recent bookings.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ApprovalStatus, Booking, RecordId, Venue, VenueField};

/// Most pressing problem of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VenueIssue {
    /// The venue is not accepting bookings.
    Closed,
    /// Open, but every field is disabled or none exist.
    NoActiveFields,
    /// Open with fields, but nobody booked within the window.
    NoRecentBookings,
    /// Nothing to report.
    #[serde(rename = "none")]
    Healthy,
}

impl VenueIssue {
    /// Applies the first-match rule.
    #[must_use]
    pub const fn classify(is_active: bool, active_fields: usize, recent_bookings: usize) -> Self {
        if !is_active {
            Self::Closed
        } else if active_fields == 0 {
            Self::NoActiveFields
        } else if recent_bookings == 0 {
            Self::NoRecentBookings
        } else {
            Self::Healthy
        }
    }
}

/// One row of the status monitor.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VenueStatus {
    /// Venue id.
    pub venue_id: RecordId,
    /// Venue name.
    pub name: String,
    /// Moderation state.
    pub approval_status: ApprovalStatus,
    /// Whether the venue is open.
    pub is_active: bool,
    /// Bookable fields.
    pub active_fields: usize,
    /// Bookings inside the recent window.
    pub recent_bookings: usize,
    /// Derived indicator.
    pub issue: VenueIssue,
}

/// Counts for the status monitor cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct VenueStatusSummary {
    /// Venues considered.
    pub total: usize,
    /// Open venues.
    pub open: usize,
    /// Closed venues.
    pub closed: usize,
    /// Venues with any indicator other than healthy.
    pub with_issues: usize,
    /// Open venues without an active field.
    pub no_active_fields: usize,
    /// Open venues with fields but no recent booking.
    pub no_recent_bookings: usize,
}

/// Classifies every venue.
///
/// `recent_bookings` must already be limited to the monitoring window.
/// Output keeps the order of `venues`.
#[must_use]
pub fn classify_venues(
    venues: &[Venue],
    fields: &[VenueField],
    recent_bookings: &[Booking],
) -> (Vec<VenueStatus>, VenueStatusSummary) {
    let mut active_fields: HashMap<&RecordId, usize> = HashMap::new();
    for field in fields.iter().filter(|f| f.is_active) {
        *active_fields.entry(&field.venue_id).or_default() += 1;
    }
    let mut bookings: HashMap<&RecordId, usize> = HashMap::new();
    for booking in recent_bookings {
        *bookings.entry(&booking.venue_id).or_default() += 1;
    }

    let mut summary = VenueStatusSummary::default();
    let statuses = venues
        .iter()
        .map(|venue| {
            let active = active_fields.get(&venue.id).copied().unwrap_or(0);
            let recent = bookings.get(&venue.id).copied().unwrap_or(0);
            let issue = VenueIssue::classify(venue.is_active, active, recent);

            summary.total += 1;
            match issue {
                VenueIssue::Closed => summary.closed += 1,
                VenueIssue::NoActiveFields => summary.no_active_fields += 1,
                VenueIssue::NoRecentBookings => summary.no_recent_bookings += 1,
                VenueIssue::Healthy => {}
            }
            if venue.is_active {
                summary.open += 1;
            }
            if issue != VenueIssue::Healthy {
                summary.with_issues += 1;
            }

            VenueStatus {
                venue_id: venue.id.clone(),
                name: venue.name.clone(),
                approval_status: venue.approval_status,
                is_active: venue.is_active,
                active_fields: active,
                recent_bookings: recent,
                issue,
            }
        })
        .collect();

    (statuses, summary)
}
