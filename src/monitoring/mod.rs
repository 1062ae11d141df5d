//! Classification of disputes and venues for the admin summary cards.

pub mod disputes;
pub mod venue_status;

pub use disputes::{DisputeFilter, DisputeSummary, PriorityCount, StatusCount};
pub use venue_status::{VenueIssue, VenueStatus, VenueStatusSummary, classify_venues};
