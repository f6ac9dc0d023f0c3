//! The standardized event envelope and its recognized payload variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current envelope schema version stamped by producers.
pub const ENVELOPE_VERSION: u32 = 1;

/// Wire name for the user registration event.
pub const TYPE_USER_REGISTERED: &str = "user.registered";
/// Wire name for the dish vote event.
pub const TYPE_DISH_VOTED: &str = "dish.voted";
/// Wire name for the dish vote retraction event.
pub const TYPE_DISH_RETRACTED: &str = "dish.retracted";

/// Lifecycle status of the event itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// The originating domain action has committed.
    Confirmed,
    /// The originating domain action is awaiting confirmation.
    Pending,
}

/// Payload for `user.registered`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegistered {
    /// Display name chosen at registration.
    pub username: String,
    /// Registered email, when the identity provider shares it.
    #[serde(default)]
    pub email: Option<String>,
}

/// Payload for `dish.voted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishVoted {
    /// The dish receiving the vote.
    pub dish_id: String,
    /// The category the vote is cast in (one active vote per user here).
    pub category: String,
    /// Rating/position assigned by the voter.
    pub rank: u32,
}

/// Payload for `dish.retracted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishRetracted {
    /// The category whose active vote is withdrawn.
    pub category: String,
}

/// Closed set of payload variants recognized by the pipeline.
///
/// Unrecognized `event_type` values never construct a variant; the validator
/// rejects them before any business logic runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// A user completed registration.
    UserRegistered(UserRegistered),
    /// A user cast (or re-cast) a ranking vote.
    DishVoted(DishVoted),
    /// A user withdrew their active vote in a category.
    DishRetracted(DishRetracted),
}

impl EventKind {
    /// Returns the wire `event_type` tag for this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::UserRegistered(_) => TYPE_USER_REGISTERED,
            EventKind::DishVoted(_) => TYPE_DISH_VOTED,
            EventKind::DishRetracted(_) => TYPE_DISH_RETRACTED,
        }
    }
}

/// A validated event envelope.
///
/// `event_id` is the idempotency key: reprocessing the same id must be a
/// no-op on all downstream state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Globally unique event identifier.
    pub event_id: String,
    /// Event creation time. An ordering heuristic, not a guarantee.
    pub timestamp: DateTime<Utc>,
    /// Origin system/component identifier.
    pub source: String,
    /// Schema version of the payload.
    pub version: u32,
    /// Correlation identifier propagated across the pipeline.
    pub trace_id: String,
    /// Actor identifier.
    pub user_id: String,
    /// Lifecycle status of the event.
    pub status: EventStatus,
    /// Variant-specific payload.
    pub kind: EventKind,
    /// Open key/value bag, non-authoritative.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Envelope {
    /// Returns the wire `event_type` tag for this envelope's payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// Serializes the envelope into its wire JSON representation, with
    /// `event_type` and `payload` as separate fields.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        let payload = match &self.kind {
            EventKind::UserRegistered(p) => serde_json::to_value(p),
            EventKind::DishVoted(p) => serde_json::to_value(p),
            EventKind::DishRetracted(p) => serde_json::to_value(p),
        }
        .expect("payload serialization is infallible");

        serde_json::json!({
            "event_id": self.event_id,
            "timestamp": self.timestamp.to_rfc3339(),
            "event_type": self.event_type(),
            "source": self.source,
            "version": self.version,
            "trace_id": self.trace_id,
            "user_id": self.user_id,
            "status": self.status,
            "payload": payload,
            "metadata": self.metadata,
        })
    }
}

/// Last-writer-wins resolution: returns `true` when an incoming event with
/// `(new_timestamp, new_event_id)` supersedes stored state written by
/// `(current_timestamp, current_event_id)`.
///
/// Ties on timestamp are broken by lexical `event_id` order so that either
/// delivery order converges to the same winner.
#[must_use]
pub fn supersedes(
    new_timestamp: DateTime<Utc>,
    new_event_id: &str,
    current_timestamp: DateTime<Utc>,
    current_event_id: &str,
) -> bool {
    new_timestamp > current_timestamp
        || (new_timestamp == current_timestamp && new_event_id > current_event_id)
}
