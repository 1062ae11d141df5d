//! Domain layer: records, identifiers, and the realtime change feed.
//!
//! This module contains the read models for backend rows, the record
//! identifier newtype, timestamp helpers, and the broadcast feed that
//! carries row changes to realtime subscribers.

pub mod change_feed;
pub mod record_id;
pub mod records;
pub mod row_change;
pub mod timestamp;

pub use change_feed::ChangeFeed;
pub use record_id::RecordId;
pub use records::{
    ApprovalStatus, Booking, BookingStatus, Dispute, DisputePriority, DisputeStatus,
    Message, Notification, PlayerRef, User, UserType, Venue, VenueField, VenueRef,
};
pub use row_change::{ChangeKind, RowChange};
