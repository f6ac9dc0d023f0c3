//! Shared fixtures for building envelopes and catalog records in tests.

use chrono::{DateTime, TimeZone, Utc};
use makan_core::envelope::{
    DishRetracted, DishVoted, ENVELOPE_VERSION, Envelope, EventKind, EventStatus,
};
use makan_core::repository::DishRecord;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Builds a `dish.voted` envelope with the given identity and content.
#[must_use]
pub fn vote_envelope(
    event_id: &str,
    timestamp: DateTime<Utc>,
    user_id: &str,
    category: &str,
    dish_id: &str,
    rank: u32,
) -> Envelope {
    Envelope {
        event_id: event_id.to_owned(),
        timestamp,
        source: "makan.test".to_owned(),
        version: ENVELOPE_VERSION,
        trace_id: format!("trace-{event_id}"),
        user_id: user_id.to_owned(),
        status: EventStatus::Confirmed,
        kind: EventKind::DishVoted(DishVoted {
            dish_id: dish_id.to_owned(),
            category: category.to_owned(),
            rank,
        }),
        metadata: serde_json::Map::new(),
    }
}

/// Builds a `dish.retracted` envelope for a user's category.
#[must_use]
pub fn retract_envelope(
    event_id: &str,
    timestamp: DateTime<Utc>,
    user_id: &str,
    category: &str,
) -> Envelope {
    Envelope {
        event_id: event_id.to_owned(),
        timestamp,
        source: "makan.test".to_owned(),
        version: ENVELOPE_VERSION,
        trace_id: format!("trace-{event_id}"),
        user_id: user_id.to_owned(),
        status: EventStatus::Confirmed,
        kind: EventKind::DishRetracted(DishRetracted {
            category: category.to_owned(),
        }),
        metadata: serde_json::Map::new(),
    }
}

/// Builds a minimal catalog record for `dish_id` with only required fields
/// populated.
#[must_use]
pub fn sample_dish(dish_id: &str) -> DishRecord {
    DishRecord {
        id: dish_id.to_owned(),
        name: format!("Dish {dish_id}"),
        description: None,
        restaurant_id: "r1".to_owned(),
        restaurant_name: "Warung Satu".to_owned(),
        price: None,
        category: None,
        tags: Vec::new(),
        image_url: None,
        created_at: base_time(),
        updated_at: base_time(),
    }
}
