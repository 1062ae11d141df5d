//! Backend layer: the query interface to the hosted data platform.
//!
//! Provides the [`Backend`] trait for reads, inserts and updates against the
//! marketplace tables. Two implementations exist: [`InMemoryBackend`] for
//! local runs and tests, and [`PostgresBackend`] which speaks to the
//! platform's PostgreSQL database through `sqlx::PgPool`. Both publish a
//! [`crate::domain::RowChange`] for every write.

pub mod memory;
pub mod postgres;
pub mod query;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

pub use memory::InMemoryBackend;
pub use postgres::PostgresBackend;
pub use query::{Filter, Query};

/// Tables of the marketplace schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Accounts of every role.
    Users,
    /// Listed venues.
    Venues,
    /// Field reservations.
    Bookings,
    /// Complaints about bookings.
    Disputes,
    /// Direct messages between users.
    Messages,
    /// In-app notifications.
    Notifications,
    /// Owner announcements shown on venue pages.
    VenueAnnouncements,
    /// Individual pitches within a venue.
    VenueFields,
    /// Player reviews of venues.
    Reviews,
}

impl Table {
    /// All tables.
    pub const ALL: [Self; 9] = [
        Self::Users,
        Self::Venues,
        Self::Bookings,
        Self::Disputes,
        Self::Messages,
        Self::Notifications,
        Self::VenueAnnouncements,
        Self::VenueFields,
        Self::Reviews,
    ];

    /// SQL name of the table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Venues => "venues",
            Self::Bookings => "bookings",
            Self::Disputes => "disputes",
            Self::Messages => "messages",
            Self::Notifications => "notifications",
            Self::VenueAnnouncements => "venue_announcements",
            Self::VenueFields => "venue_fields",
            Self::Reviews => "reviews",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown table: {s}")))
    }
}

/// Query interface to the data platform.
///
/// Rows travel as JSON objects; use [`fetch`] to decode them into records.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Returns the rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::QueryFailed`] if the backend rejects the query.
    async fn select(&self, query: &Query) -> Result<Vec<serde_json::Value>, GatewayError>;

    /// Inserts one row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::QueryFailed`] if the write fails, or
    /// [`GatewayError::InvalidRequest`] if `row` is not a JSON object.
    async fn insert(
        &self,
        table: Table,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError>;

    /// Merges `patch` into every row matching `query` and returns the
    /// updated rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::QueryFailed`] if the write fails, or
    /// [`GatewayError::InvalidRequest`] if `patch` is not a JSON object.
    async fn update(
        &self,
        query: &Query,
        patch: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, GatewayError>;
}

/// Runs `query` and decodes every row as `T`.
///
/// # Errors
///
/// Propagates backend failures and returns [`GatewayError::Decode`] for
/// rows that do not match `T`.
pub async fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
) -> Result<Vec<T>, GatewayError> {
    let rows = backend.select(query).await.inspect_err(|e| {
        tracing::error!(table = %query.table, error = %e, "query failed");
    })?;
    decode_rows(query.table, rows)
}

/// Runs `query` and decodes the first row, failing if there is none.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] when no row matches, plus everything
/// [`fetch`] can return.
pub async fn fetch_one<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
    id: &str,
) -> Result<T, GatewayError> {
    fetch::<T>(backend, &query.clone().limit(1))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NotFound {
            table: query.table.as_str(),
            id: id.to_string(),
        })
}

/// Decodes JSON rows as `T`.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] on the first row that does not match.
pub fn decode_rows<T: DeserializeOwned>(
    table: Table,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<T>, GatewayError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| GatewayError::Decode {
                table: table.as_str(),
                reason: e.to_string(),
            })
        })
        .collect()
}
