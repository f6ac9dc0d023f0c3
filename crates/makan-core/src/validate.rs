//! Structural envelope validation.
//!
//! Validation is purely structural: required fields present, correct
//! primitive types, `event_type` drawn from the recognized set. It runs
//! before any side-effecting operation and accumulates every issue it finds
//! rather than stopping at the first.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::envelope::{
    Envelope, EventKind, EventStatus, TYPE_DISH_RETRACTED, TYPE_DISH_VOTED, TYPE_USER_REGISTERED,
};
use crate::error::{FieldIssue, ValidationError};

/// Validates an arbitrary structured input against the envelope schema.
///
/// # Errors
///
/// Returns a `ValidationError` enumerating every missing or malformed field.
/// Unknown `event_type` values are rejected, not passed through.
pub fn validate_envelope(raw: &Value) -> Result<Envelope, ValidationError> {
    let mut issues = Vec::new();

    let Some(object) = raw.as_object() else {
        return Err(ValidationError::new(vec![FieldIssue::new(
            "envelope",
            "expected a JSON object",
        )]));
    };

    let event_id = required_string(object, "event_id", &mut issues);
    let timestamp = required_timestamp(object, &mut issues);
    let source = required_string(object, "source", &mut issues);
    let version = required_version(object, &mut issues);
    let trace_id = required_string(object, "trace_id", &mut issues);
    let user_id = required_string(object, "user_id", &mut issues);
    let status = required_status(object, &mut issues);
    let kind = required_payload(object, &mut issues);
    let metadata = optional_metadata(object, &mut issues);

    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    // All accessors push an issue before returning None, so every unwrap
    // here is guarded by the emptiness check above.
    Ok(Envelope {
        event_id: event_id.expect("validated"),
        timestamp: timestamp.expect("validated"),
        source: source.expect("validated"),
        version: version.expect("validated"),
        trace_id: trace_id.expect("validated"),
        user_id: user_id.expect("validated"),
        status: status.expect("validated"),
        kind: kind.expect("validated"),
        metadata: metadata.expect("validated"),
    })
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new(field, "missing"));
            None
        }
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.clone()),
        Some(Value::String(_)) => {
            issues.push(FieldIssue::new(field, "must not be empty"));
            None
        }
        Some(_) => {
            issues.push(FieldIssue::new(field, "must be a string"));
            None
        }
    }
}

fn required_timestamp(
    object: &serde_json::Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<DateTime<Utc>> {
    let raw = required_string(object, "timestamp", issues)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            issues.push(FieldIssue::new(
                "timestamp",
                "not a valid RFC 3339 timestamp",
            ));
            None
        }
    }
}

fn required_version(
    object: &serde_json::Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<u32> {
    match object.get("version") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new("version", "missing"));
            None
        }
        Some(Value::Number(value)) => match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(version) => Some(version),
            None => {
                issues.push(FieldIssue::new("version", "must be a non-negative integer"));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new("version", "must be a non-negative integer"));
            None
        }
    }
}

fn required_status(
    object: &serde_json::Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<EventStatus> {
    let raw = required_string(object, "status", issues)?;
    match raw.as_str() {
        "confirmed" => Some(EventStatus::Confirmed),
        "pending" => Some(EventStatus::Pending),
        other => {
            issues.push(FieldIssue::new(
                "status",
                format!("unknown status '{other}'"),
            ));
            None
        }
    }
}

fn required_payload(
    object: &serde_json::Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<EventKind> {
    let event_type = required_string(object, "event_type", issues)?;

    let payload = match object.get("payload") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::new("payload", "missing"));
            return None;
        }
        Some(value @ Value::Object(_)) => value.clone(),
        Some(_) => {
            issues.push(FieldIssue::new("payload", "must be an object"));
            return None;
        }
    };

    let parsed = match event_type.as_str() {
        TYPE_USER_REGISTERED => serde_json::from_value(payload).map(EventKind::UserRegistered),
        TYPE_DISH_VOTED => serde_json::from_value(payload).map(EventKind::DishVoted),
        TYPE_DISH_RETRACTED => serde_json::from_value(payload).map(EventKind::DishRetracted),
        other => {
            issues.push(FieldIssue::new(
                "event_type",
                format!("unrecognized event type '{other}'"),
            ));
            return None;
        }
    };

    match parsed {
        Ok(kind) => Some(kind),
        Err(error) => {
            issues.push(FieldIssue::new("payload", error.to_string()));
            None
        }
    }
}

fn optional_metadata(
    object: &serde_json::Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<serde_json::Map<String, Value>> {
    match object.get("metadata") {
        None | Some(Value::Null) => Some(serde_json::Map::new()),
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            issues.push(FieldIssue::new("metadata", "must be an object"));
            None
        }
    }
}
