//! Analytics layer: the dashboard aggregation pipeline.
//!
//! [`aggregate`] turns the users, venues, bookings and recent-activity
//! record sets into an [`AnalyticsReport`]. It performs no I/O; fetching is
//! done by [`crate::service::AnalyticsService`]. System metrics come from a
//! pluggable [`SystemHealthSource`].

pub mod aggregate;
pub mod health;
pub mod months;
pub mod report;

pub use aggregate::{AnalyticsInput, MONTHLY_ACTIVE_DAYS, aggregate};
pub use health::{StaticHealthSource, SystemHealth, SystemHealthSource};
pub use months::MonthWindow;
pub use report::AnalyticsReport;
