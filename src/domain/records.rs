//! Read models for the backend tables the gateway consumes.
//!
//! Rows are owned by the backend; the gateway decodes snapshots of them and
//! never mutates them in place. Timestamps stay as raw ISO strings, see
//! [`super::timestamp`].

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::RecordId;

/// Venue name used when a booking carries no denormalized venue.
pub const UNKNOWN_VENUE: &str = "Unknown Venue";

/// Role of a registered account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Books fields.
    Player,
    /// Lists and runs venues.
    VenueOwner,
    /// Moderates the marketplace.
    Admin,
}

impl UserType {
    /// All roles in display order.
    pub const ALL: [Self; 3] = [Self::Player, Self::VenueOwner, Self::Admin];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::VenueOwner => "venue_owner",
            Self::Admin => "admin",
        }
    }
}

/// Venue moderation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for an admin decision.
    Pending,
    /// Listed on the marketplace.
    Approved,
    /// Refused by an admin.
    Rejected,
}

impl ApprovalStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested, not yet accepted.
    Pending,
    /// Accepted by the venue.
    Confirmed,
    /// Cancelled by either side.
    Cancelled,
    /// Played.
    Completed,
}

impl BookingStatus {
    /// Whether the booking counts toward revenue.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed | Self::Completed)
    }
}

/// Dispute handling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Filed, not yet picked up.
    Open,
    /// Being investigated by an admin.
    InProgress,
    /// Settled with a resolution.
    Resolved,
    /// Closed without further action.
    Closed,
}

impl DisputeStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Resolved and closed disputes carry a `resolved_at` timestamp.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

/// Dispute urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputePriority {
    /// Can wait.
    Low,
    /// Default urgency.
    Medium,
    /// Needs attention first.
    High,
}

impl DisputePriority {
    /// All priorities in display order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire name of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Primary key.
    pub id: RecordId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Creation timestamp (ISO string).
    pub created_at: String,
    /// Account role.
    pub user_type: UserType,
    /// Whether the account is enabled.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Row of the `venues` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Venue {
    /// Primary key.
    pub id: RecordId,
    /// Venue name as listed.
    pub name: String,
    /// Creation timestamp (ISO string).
    pub created_at: String,
    /// Moderation state.
    pub approval_status: ApprovalStatus,
    /// Whether the venue is currently open for bookings.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Owning account, if known.
    #[serde(default)]
    pub owner_id: Option<RecordId>,
}

/// Venue name embedded in a booking row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VenueRef {
    /// Venue name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Player details embedded in a booking row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlayerRef {
    /// Player display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Player email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Row of the `bookings` table, optionally with embedded venue and player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    /// Primary key.
    pub id: RecordId,
    /// Creation timestamp (ISO string).
    pub created_at: String,
    /// Lifecycle state.
    pub status: BookingStatus,
    /// Price paid; strings and numbers are accepted, anything else is 0.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_amount: f64,
    /// Booked venue.
    pub venue_id: RecordId,
    /// Booking player.
    pub player_id: RecordId,
    /// Day of play (`YYYY-MM-DD`).
    #[serde(default)]
    pub booking_date: String,
    /// Slot start (`HH:MM:SS`).
    #[serde(default)]
    pub start_time: String,
    /// Slot end (`HH:MM:SS`).
    #[serde(default)]
    pub end_time: String,
    /// Embedded venue, when the query requested it.
    #[serde(default, alias = "venues")]
    pub venue: Option<VenueRef>,
    /// Embedded player, when the query requested it.
    #[serde(default, alias = "users")]
    pub player: Option<PlayerRef>,
}

impl Booking {
    /// Whether the booking counts toward revenue.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.status.is_confirmed()
    }

    /// Denormalized venue name, or [`UNKNOWN_VENUE`].
    #[must_use]
    pub fn venue_name(&self) -> &str {
        self.venue
            .as_ref()
            .and_then(|v| v.name.as_deref())
            .unwrap_or(UNKNOWN_VENUE)
    }

    /// Start time truncated to `HH:MM`.
    #[must_use]
    pub fn time_slot(&self) -> &str {
        self.start_time.get(..5).unwrap_or(&self.start_time)
    }
}

/// Row of the `disputes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dispute {
    /// Primary key.
    pub id: RecordId,
    /// Booking the dispute is about.
    #[serde(default)]
    pub booking_id: Option<RecordId>,
    /// Short summary.
    pub title: String,
    /// Complainant's account of events.
    #[serde(default)]
    pub description: String,
    /// Handling state.
    pub status: DisputeStatus,
    /// Urgency.
    pub priority: DisputePriority,
    /// Account that filed the dispute.
    pub complainant_id: RecordId,
    /// Account the dispute is against.
    #[serde(default)]
    pub defendant_id: Option<RecordId>,
    /// Admin's resolution note.
    #[serde(default)]
    pub resolution: Option<String>,
    /// When the dispute was resolved or closed (ISO string).
    #[serde(default)]
    pub resolved_at: Option<String>,
    /// Filing timestamp (ISO string).
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Row of the `venue_fields` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VenueField {
    /// Primary key.
    pub id: RecordId,
    /// Venue the field belongs to.
    pub venue_id: RecordId,
    /// Field label.
    #[serde(default)]
    pub name: String,
    /// Whether the field is bookable.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Row of the `notifications` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Primary key.
    pub id: RecordId,
    /// Recipient.
    pub user_id: RecordId,
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Category tag (e.g. `dispute_update`).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Whether the recipient has seen it.
    #[serde(default)]
    pub is_read: bool,
    /// Creation timestamp (ISO string).
    #[serde(default)]
    pub created_at: String,
}

/// Row of the `messages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    /// Primary key.
    pub id: RecordId,
    /// Author.
    pub sender_id: RecordId,
    /// Addressee.
    pub receiver_id: RecordId,
    /// Message text.
    #[serde(default)]
    pub content: String,
    /// Whether the addressee has opened it.
    #[serde(default)]
    pub is_read: bool,
    /// Creation timestamp (ISO string).
    #[serde(default)]
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

/// Coerces a JSON amount to `f64`.
///
/// Numbers pass through, numeric strings are parsed, and everything else
/// (null, empty or malformed strings, negative zero, NaN) becomes 0.
pub fn coerce_amount(value: &serde_json::Value) -> f64 {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n + 0.0 } else { 0.0 }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booking_json(amount: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "b-1",
            "created_at": "2024-03-01T10:00:00.000Z",
            "status": "confirmed",
            "total_amount": amount,
            "venue_id": "v-1",
            "player_id": 1,
            "booking_date": "2024-03-02",
            "start_time": "18:30:00",
            "end_time": "19:30:00"
        })
    }

    #[test]
    fn amount_accepts_string_and_number() {
        let Ok(a) = serde_json::from_value::<Booking>(booking_json(json!("100.50"))) else {
            panic!("string amount should decode");
        };
        let Ok(b) = serde_json::from_value::<Booking>(booking_json(json!(42))) else {
            panic!("numeric amount should decode");
        };
        assert!((a.total_amount - 100.5).abs() < f64::EPSILON);
        assert!((b.total_amount - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_amount_coerces_to_zero() {
        for raw in [json!("abc"), json!(null), json!(""), json!({"x": 1})] {
            let Ok(b) = serde_json::from_value::<Booking>(booking_json(raw)) else {
                panic!("booking should decode");
            };
            assert!(b.total_amount.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn missing_venue_falls_back_to_unknown() {
        let Ok(b) = serde_json::from_value::<Booking>(booking_json(json!(10))) else {
            panic!("booking should decode");
        };
        assert_eq!(b.venue_name(), UNKNOWN_VENUE);
        assert_eq!(b.time_slot(), "18:30");
    }

    #[test]
    fn embedded_venue_alias_is_accepted() {
        let mut raw = booking_json(json!(10));
        raw["venues"] = json!({"name": "Arena 5"});
        let Ok(b) = serde_json::from_value::<Booking>(raw) else {
            panic!("booking should decode");
        };
        assert_eq!(b.venue_name(), "Arena 5");
    }

    #[test]
    fn short_start_time_is_kept_whole() {
        let mut raw = booking_json(json!(10));
        raw["start_time"] = json!("9:00");
        let Ok(b) = serde_json::from_value::<Booking>(raw) else {
            panic!("booking should decode");
        };
        assert_eq!(b.time_slot(), "9:00");
    }

    #[test]
    fn completed_counts_as_confirmed() {
        assert!(BookingStatus::Completed.is_confirmed());
        assert!(BookingStatus::Confirmed.is_confirmed());
        assert!(!BookingStatus::Cancelled.is_confirmed());
        assert!(!BookingStatus::Pending.is_confirmed());
    }

    #[test]
    fn message_defaults_to_unread() {
        let raw = json!({"id": 12, "sender_id": "u-2", "receiver_id": "u-1", "content": "halo"});
        let Ok(m) = serde_json::from_value::<Message>(raw) else {
            panic!("message should decode");
        };
        assert!(!m.is_read);
        assert_eq!(m.id.as_str(), "12");
    }
}
