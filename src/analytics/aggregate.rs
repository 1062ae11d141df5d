//! The aggregation pipeline: raw record sets in, dashboard report out.
//!
//! [`aggregate`] is a pure function of its arguments. Grouping uses
//! insertion-ordered maps so ties keep encounter order and repeated runs
//! over the same input serialize identically.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};
use indexmap::IndexMap;

use super::health::SystemHealth;
use super::months::{MonthWindow, trailing_months};
use super::report::{
    AnalyticsReport, BookingPatterns, BookingPoint, CountPoint, DayBucket, Engagement,
    GrowthSeries, HourlyBucket, Overview, SystemMetrics, TimeSlot, UserActivity, UserTypeShare,
    VenueRevenue,
};
use crate::domain::timestamp::{parse_date, parse_timestamp, to_iso_millis};
use crate::domain::{ApprovalStatus, Booking, BookingStatus, RecordId, User, UserType, Venue};

/// Months in the growth series.
pub const GROWTH_MONTHS: u32 = 6;
/// Operating hours per day assumed by the utilization model.
pub const OPERATING_HOURS_PER_DAY: usize = 12;
/// Days per month assumed by the utilization model.
pub const OPERATING_DAYS_PER_MONTH: usize = 30;
/// Maximum entries in the top-users list.
pub const TOP_USERS: usize = 10;
/// Maximum entries in the top-venues list.
pub const TOP_VENUES: usize = 5;
/// Maximum entries in the popular-time-slots list.
pub const TOP_TIME_SLOTS: usize = 10;
/// Trailing window, in days, of the monthly active user count. The
/// recent-bookings input must cover at least this much.
pub const MONTHLY_ACTIVE_DAYS: i64 = 30;
/// Error-rate proxy per percentage point of cancellations.
pub const ERROR_RATE_PROXY_FACTOR: f64 = 0.1;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The four record sets the pipeline consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsInput {
    /// Every account.
    pub users: Vec<User>,
    /// Every venue.
    pub venues: Vec<Venue>,
    /// Every booking, with embedded venue name and player details.
    pub bookings: Vec<Booking>,
    /// Bookings created in the trailing activity window.
    pub recent_bookings: Vec<Booking>,
}

/// Derives the dashboard report.
///
/// `now` fixes both the reference instant and the local offset used for
/// month boundaries and hour-of-day buckets.
#[must_use]
pub fn aggregate(
    input: &AnalyticsInput,
    now: DateTime<FixedOffset>,
    health: &SystemHealth,
) -> AnalyticsReport {
    let months = trailing_months(now, GROWTH_MONTHS);
    let overview = overview(input, months.last());
    let growth = growth(input, &months);
    let revenue_growth = revenue_growth(&growth.bookings);

    AnalyticsReport {
        generated_at: to_iso_millis(&now),
        engagement: engagement(input, &months, now),
        top_users: top_users(input),
        user_type_distribution: user_type_distribution(&input.users),
        hourly_activity: hourly_activity(&input.recent_bookings, now),
        venue_utilization: venue_utilization(input),
        top_venues: top_venues(&input.bookings),
        booking_patterns: booking_patterns(input, now),
        system: system_metrics(health, overview.cancellation_rate),
        revenue_growth,
        growth,
        overview,
    }
}

fn overview(input: &AnalyticsInput, current: Option<&MonthWindow>) -> Overview {
    let bookings = &input.bookings;
    let count_status = |s: BookingStatus| bookings.iter().filter(|b| b.status == s).count();
    let count_approval = |s: ApprovalStatus| {
        input
            .venues
            .iter()
            .filter(|v| v.approval_status == s)
            .count()
    };

    let confirmed: Vec<&Booking> = bookings.iter().filter(|b| b.is_confirmed()).collect();
    let total_revenue: f64 = confirmed.iter().map(|b| b.total_amount).sum();
    let cancelled = count_status(BookingStatus::Cancelled);

    Overview {
        total_users: input.users.len(),
        active_users: input.users.iter().filter(|u| u.is_active).count(),
        new_users_this_month: current.map_or(0, |m| {
            input.users.iter().filter(|u| m.contains(&u.created_at)).count()
        }),
        total_venues: input.venues.len(),
        approved_venues: count_approval(ApprovalStatus::Approved),
        pending_venues: count_approval(ApprovalStatus::Pending),
        rejected_venues: count_approval(ApprovalStatus::Rejected),
        total_bookings: bookings.len(),
        confirmed_bookings: confirmed.len(),
        pending_bookings: count_status(BookingStatus::Pending),
        cancelled_bookings: cancelled,
        total_revenue: round2(total_revenue),
        average_booking_value: round2(ratio(total_revenue, confirmed.len())),
        cancellation_rate: percent(cancelled, bookings.len()),
    }
}

fn growth(input: &AnalyticsInput, months: &[MonthWindow]) -> GrowthSeries {
    let users = months
        .iter()
        .map(|m| CountPoint {
            month: m.label.clone(),
            year: m.year,
            count: input.users.iter().filter(|u| m.contains(&u.created_at)).count(),
        })
        .collect();

    let venues = months
        .iter()
        .map(|m| CountPoint {
            month: m.label.clone(),
            year: m.year,
            count: input
                .venues
                .iter()
                .filter(|v| v.approval_status == ApprovalStatus::Approved)
                .filter(|v| m.contains(&v.created_at))
                .count(),
        })
        .collect();

    let bookings = months
        .iter()
        .map(|m| {
            let in_month: Vec<&Booking> = input
                .bookings
                .iter()
                .filter(|b| m.contains(&b.created_at))
                .collect();
            BookingPoint {
                month: m.label.clone(),
                year: m.year,
                bookings: in_month.len(),
                revenue: round2(
                    in_month
                        .iter()
                        .filter(|b| b.is_confirmed())
                        .map(|b| b.total_amount)
                        .sum(),
                ),
            }
        })
        .collect();

    GrowthSeries {
        users,
        venues,
        bookings,
    }
}

fn engagement(
    input: &AnalyticsInput,
    months: &[MonthWindow],
    now: DateTime<FixedOffset>,
) -> Engagement {
    let mut recent = months.iter().rev();
    let current = bookers_in(&input.bookings, recent.next());
    let previous = bookers_in(&input.bookings, recent.next());
    let retained = previous.iter().filter(|p| current.contains(*p)).count();

    let active_within = |days: i64| -> usize {
        let cutoff = now - Duration::days(days);
        input
            .recent_bookings
            .iter()
            .filter(|b| parse_timestamp(&b.created_at).is_some_and(|ts| ts >= cutoff))
            .map(|b| &b.player_id)
            .collect::<HashSet<_>>()
            .len()
    };

    Engagement {
        retention_rate: percent(retained, previous.len()),
        daily_active_users: active_within(1),
        weekly_active_users: active_within(7),
        monthly_active_users: active_within(MONTHLY_ACTIVE_DAYS),
    }
}

fn bookers_in<'a>(bookings: &'a [Booking], month: Option<&MonthWindow>) -> HashSet<&'a RecordId> {
    month
        .map(|m| {
            bookings
                .iter()
                .filter(|b| m.contains(&b.created_at))
                .map(|b| &b.player_id)
                .collect()
        })
        .unwrap_or_default()
}

fn top_users(input: &AnalyticsInput) -> Vec<UserActivity> {
    let directory: HashMap<&RecordId, &User> = input.users.iter().map(|u| (&u.id, u)).collect();

    let mut rollup: IndexMap<&RecordId, UserActivity> = IndexMap::new();
    for booking in &input.bookings {
        let entry = rollup.entry(&booking.player_id).or_insert_with(|| {
            let known = directory.get(&booking.player_id);
            let embedded = booking.player.as_ref();
            UserActivity {
                user_id: booking.player_id.clone(),
                name: embedded
                    .and_then(|p| p.name.clone())
                    .or_else(|| known.map(|u| u.name.clone()))
                    .unwrap_or_else(|| "Unknown User".to_string()),
                email: embedded
                    .and_then(|p| p.email.clone())
                    .or_else(|| known.map(|u| u.email.clone()))
                    .unwrap_or_default(),
                total_bookings: 0,
                total_spent: 0.0,
            }
        });
        entry.total_bookings += 1;
        if booking.is_confirmed() {
            entry.total_spent += booking.total_amount;
        }
    }

    let mut users: Vec<UserActivity> = rollup.into_values().collect();
    users.sort_by(|a, b| b.total_bookings.cmp(&a.total_bookings));
    users.truncate(TOP_USERS);
    for user in &mut users {
        user.total_spent = round2(user.total_spent);
    }
    users
}

fn user_type_distribution(users: &[User]) -> Vec<UserTypeShare> {
    UserType::ALL
        .into_iter()
        .map(|user_type| {
            let count = users.iter().filter(|u| u.user_type == user_type).count();
            UserTypeShare {
                user_type,
                count,
                percentage: percent(count, users.len()),
            }
        })
        .collect()
}

fn hourly_activity(recent: &[Booking], now: DateTime<FixedOffset>) -> Vec<HourlyBucket> {
    let mut counts = [0usize; 24];
    let offset = now.offset();
    for ts in recent.iter().filter_map(|b| parse_timestamp(&b.created_at)) {
        let hour = ts.with_timezone(offset).hour() as usize;
        if let Some(slot) = counts.get_mut(hour) {
            *slot += 1;
        }
    }
    (0u32..)
        .zip(counts)
        .map(|(hour, bookings)| HourlyBucket { hour, bookings })
        .collect()
}

fn venue_utilization(input: &AnalyticsInput) -> u32 {
    let approved = input
        .venues
        .iter()
        .filter(|v| v.approval_status == ApprovalStatus::Approved)
        .count();
    let confirmed = input.bookings.iter().filter(|b| b.is_confirmed()).count();
    percent(
        confirmed,
        approved * OPERATING_DAYS_PER_MONTH * OPERATING_HOURS_PER_DAY,
    )
}

fn top_venues(bookings: &[Booking]) -> Vec<VenueRevenue> {
    let mut by_name: IndexMap<&str, VenueRevenue> = IndexMap::new();
    for booking in bookings.iter().filter(|b| b.is_confirmed()) {
        let name = booking.venue_name();
        let entry = by_name.entry(name).or_insert_with(|| VenueRevenue {
            name: name.to_string(),
            revenue: 0.0,
            bookings: 0,
        });
        entry.revenue += booking.total_amount;
        entry.bookings += 1;
    }

    let mut venues: Vec<VenueRevenue> = by_name.into_values().collect();
    venues.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    venues.truncate(TOP_VENUES);
    for venue in &mut venues {
        venue.revenue = round2(venue.revenue);
    }
    venues
}

fn booking_patterns(input: &AnalyticsInput, now: DateTime<FixedOffset>) -> BookingPatterns {
    let mut per_user: IndexMap<&RecordId, usize> = IndexMap::new();
    for booking in &input.bookings {
        *per_user.entry(&booking.player_id).or_default() += 1;
    }
    let repeaters = per_user.values().filter(|n| **n > 1).count();

    let mut days = [0usize; 7];
    for booking in &input.bookings {
        if let Some(slot) = days.get_mut(weekday_index(booking, now)) {
            *slot += 1;
        }
    }

    let mut slots: IndexMap<&str, usize> = IndexMap::new();
    for booking in input.bookings.iter().filter(|b| !b.start_time.is_empty()) {
        *slots.entry(booking.time_slot()).or_default() += 1;
    }
    let mut popular: Vec<TimeSlot> = slots
        .into_iter()
        .map(|(time, bookings)| TimeSlot {
            time: time.to_string(),
            bookings,
        })
        .collect();
    popular.sort_by(|a, b| b.bookings.cmp(&a.bookings));
    popular.truncate(TOP_TIME_SLOTS);

    BookingPatterns {
        average_bookings_per_user: round2(ratio(
            input.bookings.len() as f64,
            input.users.len(),
        )),
        repeat_booking_rate: percent(repeaters, input.users.len()),
        bookings_by_day_of_week: (0u32..)
            .zip(WEEKDAYS.iter().zip(days))
            .map(|(day_index, (day, bookings))| DayBucket {
                day_index,
                day: (*day).to_string(),
                bookings,
            })
            .collect(),
        popular_time_slots: popular,
    }
}

/// Weekday of play, 0 = Sunday.
///
/// Falls back to the local creation date when `booking_date` is unusable,
/// and to Sunday when neither parses, so every booking lands in a bucket.
fn weekday_index(booking: &Booking, now: DateTime<FixedOffset>) -> usize {
    parse_date(&booking.booking_date)
        .or_else(|| {
            parse_timestamp(&booking.created_at)
                .map(|ts| ts.with_timezone(now.offset()).date_naive())
        })
        .map_or(0, |d| d.weekday().num_days_from_sunday() as usize)
}

fn revenue_growth(series: &[BookingPoint]) -> i64 {
    let [.., previous, latest] = series else {
        return 0;
    };
    if previous.revenue == 0.0 {
        return 0;
    }
    js_round((latest.revenue - previous.revenue) / previous.revenue * 100.0) as i64
}

fn system_metrics(health: &SystemHealth, cancellation_rate: u32) -> SystemMetrics {
    let proxy = round2(f64::from(cancellation_rate) * ERROR_RATE_PROXY_FACTOR);
    SystemMetrics {
        uptime_percent: health.uptime_percent,
        avg_response_time_ms: health.avg_response_time_ms,
        error_rate_percent: health.error_rate_percent.unwrap_or(proxy),
        approximate: health.approximate || health.error_rate_percent.is_none(),
    }
}

/// Rounds half toward positive infinity.
fn js_round(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn round2(x: f64) -> f64 {
    js_round(x * 100.0) / 100.0 + 0.0
}

fn ratio(part: f64, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part / whole as f64 }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    js_round(part as f64 / whole as f64 * 100.0).max(0.0) as u32
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: &str = "2024-03-15T12:00:00Z";

    fn now() -> DateTime<FixedOffset> {
        let Ok(ts) = DateTime::parse_from_rfc3339(NOW) else {
            panic!("valid timestamp");
        };
        ts
    }

    fn health() -> SystemHealth {
        SystemHealth {
            uptime_percent: 99.9,
            avg_response_time_ms: 120,
            error_rate_percent: None,
            approximate: true,
            source: "test".to_string(),
        }
    }

    fn user(id: u32, user_type: &str, created_at: &str) -> User {
        let Ok(u) = serde_json::from_value(json!({
            "id": id,
            "name": format!("User {id}"),
            "email": format!("user{id}@example.com"),
            "created_at": created_at,
            "user_type": user_type,
        })) else {
            panic!("valid user");
        };
        u
    }

    fn venue(id: &str, status: &str, created_at: &str) -> Venue {
        let Ok(v) = serde_json::from_value(json!({
            "id": id,
            "name": format!("Venue {id}"),
            "created_at": created_at,
            "approval_status": status,
        })) else {
            panic!("valid venue");
        };
        v
    }

    fn booking(fields: serde_json::Value) -> Booking {
        let mut base = json!({
            "id": "b",
            "created_at": "2024-03-10T10:00:00.000Z",
            "status": "confirmed",
            "total_amount": 0,
            "venue_id": "v-1",
            "player_id": 1,
            "booking_date": "2024-03-10",
            "start_time": "18:00:00",
            "end_time": "19:00:00",
        });
        if let (Some(base_map), Some(extra)) = (base.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                base_map.insert(k.clone(), v.clone());
            }
        }
        let Ok(b) = serde_json::from_value(base) else {
            panic!("valid booking");
        };
        b
    }

    fn run(input: &AnalyticsInput) -> AnalyticsReport {
        aggregate(input, now(), &health())
    }

    #[test]
    fn average_value_counts_only_confirmed() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"status": "confirmed", "total_amount": "100"})),
                booking(json!({"status": "cancelled", "total_amount": 500})),
            ],
            ..AnalyticsInput::default()
        };
        let report = run(&input);
        assert!((report.overview.average_booking_value - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.overview.cancellation_rate, 50);
        assert!((report.overview.total_revenue - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bookings_per_user_and_repeat_rate() {
        let input = AnalyticsInput {
            users: vec![
                user(1, "player", "2024-01-01T00:00:00.000Z"),
                user(2, "player", "2024-01-01T00:00:00.000Z"),
            ],
            bookings: vec![
                booking(json!({"player_id": 1})),
                booking(json!({"player_id": 1})),
                booking(json!({"player_id": 2})),
            ],
            ..AnalyticsInput::default()
        };
        let patterns = run(&input).booking_patterns;
        assert!((patterns.average_bookings_per_user - 1.5).abs() < f64::EPSILON);
        assert_eq!(patterns.repeat_booking_rate, 50);
    }

    #[test]
    fn day_of_week_buckets_cover_every_booking() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"booking_date": "2024-03-10"})), // Sunday
                booking(json!({"booking_date": "2024-03-11"})), // Monday
                booking(json!({"booking_date": "not a date"})),
                booking(json!({"booking_date": "", "created_at": "garbage"})),
            ],
            ..AnalyticsInput::default()
        };
        let days = run(&input).booking_patterns.bookings_by_day_of_week;
        assert_eq!(days.len(), 7);
        let total: usize = days.iter().map(|d| d.bookings).sum();
        assert_eq!(total, input.bookings.len());
        assert_eq!(days.first().map(|d| (d.day.as_str(), d.bookings)), Some(("Sun", 3)));
        assert_eq!(days.get(1).map(|d| d.bookings), Some(1));
    }

    #[test]
    fn user_type_percentages_sum_to_about_100() {
        let input = AnalyticsInput {
            users: vec![
                user(1, "player", "2024-01-01T00:00:00.000Z"),
                user(2, "player", "2024-01-01T00:00:00.000Z"),
                user(3, "venue_owner", "2024-01-01T00:00:00.000Z"),
            ],
            ..AnalyticsInput::default()
        };
        let dist = run(&input).user_type_distribution;
        let sum: u32 = dist.iter().map(|d| d.percentage).sum();
        assert!((99..=101).contains(&sum));
        assert_eq!(dist.first().map(|d| (d.user_type, d.count, d.percentage)), Some((UserType::Player, 2, 67)));
    }

    #[test]
    fn empty_input_yields_zeros() {
        let report = run(&AnalyticsInput::default());
        assert!(report.user_type_distribution.iter().all(|d| d.count == 0 && d.percentage == 0));
        assert_eq!(report.venue_utilization, 0);
        assert_eq!(report.revenue_growth, 0);
        assert_eq!(report.engagement.retention_rate, 0);
        assert_eq!(report.hourly_activity.len(), 24);
        assert!(report.top_users.is_empty());
        assert!(report.top_venues.is_empty());
        assert_eq!(report.growth.users.len(), 6);
        assert!(report.overview.average_booking_value.abs() < f64::EPSILON);
    }

    #[test]
    fn utilization_is_zero_without_approved_venues() {
        let input = AnalyticsInput {
            venues: vec![venue("v-1", "pending", "2024-01-01T00:00:00.000Z")],
            bookings: vec![booking(json!({})), booking(json!({}))],
            ..AnalyticsInput::default()
        };
        assert_eq!(run(&input).venue_utilization, 0);
    }

    #[test]
    fn utilization_uses_fixed_capacity() {
        let bookings = (0..36).map(|_| booking(json!({}))).collect();
        let input = AnalyticsInput {
            venues: vec![venue("v-1", "approved", "2024-01-01T00:00:00.000Z")],
            bookings,
            ..AnalyticsInput::default()
        };
        // 36 / (1 × 30 × 12) = 10 %
        assert_eq!(run(&input).venue_utilization, 10);
    }

    #[test]
    fn top_venues_sorted_capped_and_stable() {
        let mut bookings = Vec::new();
        for (name, amount) in [
            ("A", 50),
            ("B", 300),
            ("C", 50),
            ("D", 10),
            ("E", 200),
            ("F", 5),
            ("G", 1),
        ] {
            bookings.push(booking(json!({"venue": {"name": name}, "total_amount": amount})));
        }
        bookings.push(booking(json!({"total_amount": 70})));
        bookings.push(booking(json!({"venue": {"name": "B"}, "status": "cancelled", "total_amount": 999})));

        let top = run(&AnalyticsInput {
            bookings,
            ..AnalyticsInput::default()
        })
        .top_venues;
        let names: Vec<&str> = top.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["B", "E", "Unknown Venue", "A", "C"]);
        assert!(top.windows(2).all(|w| match w {
            [a, b] => a.revenue >= b.revenue,
            _ => true,
        }));
    }

    #[test]
    fn growth_series_uses_month_string_ranges() {
        let input = AnalyticsInput {
            users: vec![
                user(1, "player", "2024-03-01T00:00:00.000Z"),
                user(2, "player", "2024-02-29T23:59:59.999Z"),
                user(3, "player", "2023-09-30T00:00:00.000Z"),
                user(4, "player", "2023-08-31T00:00:00.000Z"),
            ],
            venues: vec![
                venue("v-1", "approved", "2024-03-02T00:00:00.000Z"),
                venue("v-2", "pending", "2024-03-02T00:00:00.000Z"),
            ],
            ..AnalyticsInput::default()
        };
        let report = run(&input);
        let users: Vec<(String, usize)> = report
            .growth
            .users
            .iter()
            .map(|p| (p.month.clone(), p.count))
            .collect();
        assert_eq!(
            users,
            vec![
                ("Oct".to_string(), 0),
                ("Nov".to_string(), 0),
                ("Dec".to_string(), 0),
                ("Jan".to_string(), 0),
                ("Feb".to_string(), 1),
                ("Mar".to_string(), 1),
            ]
        );
        assert_eq!(report.growth.venues.last().map(|p| p.count), Some(1));
        assert_eq!(report.overview.new_users_this_month, 1);
    }

    #[test]
    fn revenue_growth_compares_last_two_months() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"created_at": "2024-02-10T10:00:00.000Z", "total_amount": 200})),
                booking(json!({"created_at": "2024-03-10T10:00:00.000Z", "total_amount": 300})),
            ],
            ..AnalyticsInput::default()
        };
        assert_eq!(run(&input).revenue_growth, 50);
    }

    #[test]
    fn revenue_growth_is_zero_when_prior_month_empty() {
        let input = AnalyticsInput {
            bookings: vec![booking(json!({"created_at": "2024-03-10T10:00:00.000Z", "total_amount": 300}))],
            ..AnalyticsInput::default()
        };
        assert_eq!(run(&input).revenue_growth, 0);
    }

    #[test]
    fn retention_counts_returning_bookers() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"player_id": 1, "created_at": "2024-02-05T10:00:00.000Z"})),
                booking(json!({"player_id": 2, "created_at": "2024-02-06T10:00:00.000Z"})),
                booking(json!({"player_id": 3, "created_at": "2024-02-07T10:00:00.000Z"})),
                booking(json!({"player_id": 1, "created_at": "2024-03-05T10:00:00.000Z"})),
                booking(json!({"player_id": 4, "created_at": "2024-03-06T10:00:00.000Z"})),
            ],
            ..AnalyticsInput::default()
        };
        // 1 of 3 February bookers came back.
        assert_eq!(run(&input).engagement.retention_rate, 33);
    }

    #[test]
    fn active_users_use_trailing_windows() {
        let input = AnalyticsInput {
            recent_bookings: vec![
                booking(json!({"player_id": 1, "created_at": "2024-03-15T06:00:00.000Z"})),
                booking(json!({"player_id": 1, "created_at": "2024-03-15T07:00:00.000Z"})),
                booking(json!({"player_id": 2, "created_at": "2024-03-12T10:00:00.000Z"})),
                booking(json!({"player_id": 3, "created_at": "2024-02-20T10:00:00.000Z"})),
            ],
            ..AnalyticsInput::default()
        };
        let engagement = run(&input).engagement;
        assert_eq!(engagement.daily_active_users, 1);
        assert_eq!(engagement.weekly_active_users, 2);
        assert_eq!(engagement.monthly_active_users, 3);
    }

    #[test]
    fn hourly_histogram_uses_local_offset() {
        let input = AnalyticsInput {
            recent_bookings: vec![
                booking(json!({"created_at": "2024-03-14T22:30:00.000Z"})),
                booking(json!({"created_at": "not a timestamp"})),
            ],
            ..AnalyticsInput::default()
        };
        let Ok(local_now) = DateTime::parse_from_rfc3339("2024-03-15T12:00:00+02:00") else {
            panic!("valid timestamp");
        };
        let hourly = aggregate(&input, local_now, &health()).hourly_activity;
        assert_eq!(hourly.first().map(|h| h.bookings), Some(1));
        assert_eq!(hourly.iter().map(|h| h.bookings).sum::<usize>(), 1);
    }

    #[test]
    fn top_users_sorted_by_booking_count() {
        let mut bookings = Vec::new();
        for id in 1..=12 {
            bookings.push(booking(json!({"player_id": id, "total_amount": 10})));
        }
        bookings.push(booking(json!({"player_id": 5, "total_amount": 15})));
        bookings.push(booking(json!({"player_id": 5, "status": "cancelled", "total_amount": 99})));
        bookings.push(booking(json!({"player_id": 9, "player": {"name": "Nina", "email": "nina@example.com"}})));

        let top = run(&AnalyticsInput {
            users: vec![user(5, "player", "2024-01-01T00:00:00.000Z")],
            bookings,
            ..AnalyticsInput::default()
        })
        .top_users;
        assert_eq!(top.len(), 10);
        let Some(first) = top.first() else {
            panic!("expected users");
        };
        assert_eq!(first.user_id.as_str(), "5");
        assert_eq!(first.total_bookings, 3);
        assert!((first.total_spent - 25.0).abs() < f64::EPSILON);
        assert_eq!(first.name, "User 5");
        assert_eq!(top.get(1).map(|u| u.user_id.as_str()), Some("9"));
        assert_eq!(top.get(2).map(|u| u.user_id.as_str()), Some("1"));
    }

    #[test]
    fn popular_time_slots_truncate_to_minutes() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"start_time": "20:00:00"})),
                booking(json!({"start_time": "18:00:00"})),
                booking(json!({"start_time": "18:00:30"})),
            ],
            ..AnalyticsInput::default()
        };
        let slots = run(&input).booking_patterns.popular_time_slots;
        assert_eq!(
            slots.first().map(|s| (s.time.as_str(), s.bookings)),
            Some(("18:00", 2))
        );
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn error_rate_proxy_from_cancellations() {
        let input = AnalyticsInput {
            bookings: vec![
                booking(json!({"status": "cancelled"})),
                booking(json!({"status": "confirmed"})),
            ],
            ..AnalyticsInput::default()
        };
        let system = run(&input).system;
        assert!((system.error_rate_percent - 5.0).abs() < f64::EPSILON);
        assert!(system.approximate);
    }

    #[test]
    fn identical_input_serializes_identically() {
        let input = AnalyticsInput {
            users: vec![user(1, "player", "2024-03-01T00:00:00.000Z")],
            venues: vec![venue("v-1", "approved", "2024-03-01T00:00:00.000Z")],
            bookings: (0..20)
                .map(|i| {
                    booking(json!({
                        "player_id": i % 4,
                        "venue": {"name": format!("V{}", i % 3)},
                        "total_amount": 10 + i,
                        "start_time": format!("{:02}:00:00", 16 + i % 5),
                    }))
                })
                .collect(),
            recent_bookings: Vec::new(),
        };
        let a = serde_json::to_string(&run(&input)).unwrap_or_default();
        let b = serde_json::to_string(&run(&input)).unwrap_or_default();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn negative_growth_rounds_half_up() {
        assert!((js_round(-2.5) - -2.0).abs() < f64::EPSILON);
        assert!((js_round(2.5) - 3.0).abs() < f64::EPSILON);
    }
}
