//! Service layer: business logic orchestration.
//!
//! Each service holds an `Arc<dyn Backend>`, fans reads out concurrently and
//! hands the decoded records to the pure pipelines in
//! [`crate::analytics`] and [`crate::monitoring`].

pub mod analytics_service;
pub mod dispute_service;
pub mod notification_service;
pub mod venue_service;

pub use analytics_service::AnalyticsService;
pub use dispute_service::{DisputeListing, DisputeService, DisputeUpdate};
pub use notification_service::NotificationService;
pub use venue_service::{VenueMonitorService, VenueStatusReport};
