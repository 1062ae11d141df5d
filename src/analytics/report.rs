//! Output shape of the analytics pipeline.
//!
//! Every field is always present; empty inputs yield zeros and empty lists
//! rather than missing values.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{RecordId, UserType};

/// Full dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalyticsReport {
    /// Instant the report was computed for (ISO string).
    pub generated_at: String,
    /// Headline totals.
    pub overview: Overview,
    /// Six-month trailing series, oldest first.
    pub growth: GrowthSeries,
    /// Retention and active-user proxies.
    pub engagement: Engagement,
    /// Up to 10 players with the most bookings.
    pub top_users: Vec<UserActivity>,
    /// Account count and share per role.
    pub user_type_distribution: Vec<UserTypeShare>,
    /// Recent bookings per local hour of creation, 24 buckets.
    pub hourly_activity: Vec<HourlyBucket>,
    /// Confirmed bookings against a fixed 12 h × 30 d capacity, in percent.
    pub venue_utilization: u32,
    /// Up to 5 venues with the highest confirmed revenue.
    pub top_venues: Vec<VenueRevenue>,
    /// Booking frequency and timing breakdowns.
    pub booking_patterns: BookingPatterns,
    /// Percent change between the last two months of revenue.
    pub revenue_growth: i64,
    /// Operational metrics.
    pub system: SystemMetrics,
}

/// Headline totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Overview {
    /// All accounts.
    pub total_users: usize,
    /// Accounts with `is_active`.
    pub active_users: usize,
    /// Accounts created in the current calendar month.
    pub new_users_this_month: usize,
    /// All venues.
    pub total_venues: usize,
    /// Approved venues.
    pub approved_venues: usize,
    /// Venues waiting for moderation.
    pub pending_venues: usize,
    /// Rejected venues.
    pub rejected_venues: usize,
    /// All bookings.
    pub total_bookings: usize,
    /// Confirmed or completed bookings.
    pub confirmed_bookings: usize,
    /// Pending bookings.
    pub pending_bookings: usize,
    /// Cancelled bookings.
    pub cancelled_bookings: usize,
    /// Sum of confirmed booking amounts.
    pub total_revenue: f64,
    /// Mean amount of a confirmed booking.
    pub average_booking_value: f64,
    /// Cancelled share of all bookings, in percent.
    pub cancellation_rate: u32,
}

/// Trailing monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GrowthSeries {
    /// New accounts per month.
    pub users: Vec<CountPoint>,
    /// New approved venues per month.
    pub venues: Vec<CountPoint>,
    /// New bookings and their confirmed revenue per month.
    pub bookings: Vec<BookingPoint>,
}

/// Monthly count.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CountPoint {
    /// Short month name.
    pub month: String,
    /// Calendar year.
    pub year: i32,
    /// Records created in the month.
    pub count: usize,
}

/// Monthly booking count with revenue.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookingPoint {
    /// Short month name.
    pub month: String,
    /// Calendar year.
    pub year: i32,
    /// Bookings created in the month.
    pub bookings: usize,
    /// Confirmed revenue of those bookings.
    pub revenue: f64,
}

/// Retention and active-user proxies.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Engagement {
    /// Last month's bookers who booked again this month, in percent.
    pub retention_rate: u32,
    /// Distinct bookers over the trailing day.
    pub daily_active_users: usize,
    /// Distinct bookers over the trailing 7 days.
    pub weekly_active_users: usize,
    /// Distinct bookers over the trailing 30 days.
    pub monthly_active_users: usize,
}

/// Per-player rollup.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserActivity {
    /// Player id.
    pub user_id: RecordId,
    /// Player name.
    pub name: String,
    /// Player email.
    pub email: String,
    /// Bookings of any status.
    pub total_bookings: usize,
    /// Sum of confirmed booking amounts.
    pub total_spent: f64,
}

/// Share of one role.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserTypeShare {
    /// Role.
    pub user_type: UserType,
    /// Accounts with the role.
    pub count: usize,
    /// Share of all accounts, in percent.
    pub percentage: u32,
}

/// Activity in one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyBucket {
    /// Hour, 0–23.
    pub hour: u32,
    /// Records created in that hour.
    pub bookings: usize,
}

/// Revenue of one venue name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VenueRevenue {
    /// Denormalized venue name.
    pub name: String,
    /// Sum of confirmed booking amounts.
    pub revenue: f64,
    /// Confirmed bookings.
    pub bookings: usize,
}

/// Booking frequency and timing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookingPatterns {
    /// Bookings divided by accounts.
    pub average_bookings_per_user: f64,
    /// Accounts with more than one booking, in percent.
    pub repeat_booking_rate: u32,
    /// Bookings per day of play, Sunday first.
    pub bookings_by_day_of_week: Vec<DayBucket>,
    /// Up to 10 most booked start times.
    pub popular_time_slots: Vec<TimeSlot>,
}

/// Bookings on one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayBucket {
    /// 0 = Sunday.
    pub day_index: u32,
    /// Short weekday name.
    pub day: String,
    /// Bookings on that weekday.
    pub bookings: usize,
}

/// Bookings starting at one time.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TimeSlot {
    /// Start time as `HH:MM`.
    pub time: String,
    /// Bookings starting then.
    pub bookings: usize,
}

/// Operational metrics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SystemMetrics {
    /// Availability, in percent.
    pub uptime_percent: f64,
    /// Mean response time in milliseconds.
    pub avg_response_time_ms: u64,
    /// Error rate in percent; a cancellation-rate proxy unless measured.
    pub error_rate_percent: f64,
    /// `true` when any value above is a placeholder.
    pub approximate: bool,
}
