//! Data Transfer Objects for REST request/response serialization.
//!
//! Records, reports and summaries are serialized as-is; the types here only
//! add the envelopes list and write endpoints need.

pub mod common_dto;
pub mod dispute_dto;
pub mod notification_dto;

pub use common_dto::*;
pub use dispute_dto::*;
pub use notification_dto::*;
