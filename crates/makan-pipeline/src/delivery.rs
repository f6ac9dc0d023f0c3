//! Queue delivery envelope types.

use serde::Deserialize;
use serde_json::Value;

use makan_core::error::{FieldIssue, ValidationError};

/// A batch of records as delivered by the queue substrate.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueBatch {
    /// The records, in delivery order.
    pub records: Vec<QueueRecord>,
}

/// One queue record: a delivery identifier plus an opaque body.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueRecord {
    /// Identifier assigned by the delivery substrate.
    pub delivery_id: String,
    /// Raw body; JSON is parsed and validated per record.
    pub body: String,
}

/// Database mutation kinds carried by change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// A row was inserted.
    Insert,
    /// A row was modified.
    Modify,
    /// A row was removed.
    Remove,
}

/// A database-mutation-triggered change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// The mutated table.
    pub table: String,
    /// The mutation kind.
    pub operation: ChangeOp,
    /// Identifier of the mutated entity.
    pub entity_id: String,
}

/// Parses a change notification from a record body of the shape
/// `{ "data": { "table", "operation", "id" } }`.
///
/// # Errors
///
/// Returns a `ValidationError` enumerating every missing/malformed field.
pub fn parse_change(raw: &Value) -> Result<ChangeRecord, ValidationError> {
    let mut issues = Vec::new();

    let Some(data) = raw.get("data").and_then(Value::as_object) else {
        return Err(ValidationError::new(vec![FieldIssue::new(
            "data",
            "missing or not an object",
        )]));
    };

    let table = match data.get("table").and_then(Value::as_str) {
        Some(table) if !table.trim().is_empty() => Some(table.to_owned()),
        _ => {
            issues.push(FieldIssue::new("data.table", "missing or empty"));
            None
        }
    };

    let operation = match data.get("operation") {
        Some(value) => match serde_json::from_value::<ChangeOp>(value.clone()) {
            Ok(operation) => Some(operation),
            Err(_) => {
                issues.push(FieldIssue::new(
                    "data.operation",
                    "must be one of insert, modify, remove",
                ));
                None
            }
        },
        None => {
            issues.push(FieldIssue::new("data.operation", "missing"));
            None
        }
    };

    let entity_id = match data.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Some(id.to_owned()),
        _ => {
            issues.push(FieldIssue::new("data.id", "missing or empty"));
            None
        }
    };

    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    Ok(ChangeRecord {
        table: table.expect("validated"),
        operation: operation.expect("validated"),
        entity_id: entity_id.expect("validated"),
    })
}
