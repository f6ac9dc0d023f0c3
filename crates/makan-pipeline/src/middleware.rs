//! Input-validation middleware for queue deliveries.
//!
//! Runs ahead of all business handlers. Each record in a batch is parsed
//! and validated independently; a malformed record fails only itself, with
//! its error attributed by index. Records failing validation can never
//! become valid through retry, so callers route them straight to the
//! dead-letter coordinator.

use serde_json::Value;

use makan_core::envelope::Envelope;
use makan_core::error::{FieldIssue, ValidationError};
use makan_core::validate::validate_envelope;

use crate::delivery::{ChangeRecord, QueueBatch, parse_change};

/// A validated record, ready for dispatch.
#[derive(Debug)]
pub enum DeliveryItem {
    /// A standardized event envelope.
    Event(Envelope),
    /// A database-mutation change notification.
    Change(ChangeRecord),
}

/// A record that passed validation, with its position in the batch.
#[derive(Debug)]
pub struct AcceptedRecord {
    /// Position within the delivered batch.
    pub index: usize,
    /// Delivery identifier from the substrate.
    pub delivery_id: String,
    /// The validated content.
    pub item: DeliveryItem,
}

/// A record that failed validation, with its error attributed by index.
#[derive(Debug)]
pub struct RejectedRecord {
    /// Position within the delivered batch.
    pub index: usize,
    /// Delivery identifier from the substrate.
    pub delivery_id: String,
    /// Every structural issue found.
    pub error: ValidationError,
    /// The original body, preserved for the dead-letter store.
    pub payload: Value,
}

/// Outcome of validating a batch: per-record accept/reject, batch intact.
#[derive(Debug)]
pub struct BatchValidation {
    /// Records that passed, in batch order.
    pub accepted: Vec<AcceptedRecord>,
    /// Records that failed, in batch order.
    pub rejected: Vec<RejectedRecord>,
}

/// Validates every record of a batch independently.
#[must_use]
pub fn validate_batch(batch: &QueueBatch) -> BatchValidation {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in batch.records.iter().enumerate() {
        let raw: Value = match serde_json::from_str(&record.body) {
            Ok(raw) => raw,
            Err(error) => {
                rejected.push(RejectedRecord {
                    index,
                    delivery_id: record.delivery_id.clone(),
                    error: ValidationError::new(vec![FieldIssue::new(
                        "body",
                        format!("not valid JSON: {error}"),
                    )]),
                    payload: Value::String(record.body.clone()),
                });
                continue;
            }
        };

        let result = if raw.get("event_type").is_some() {
            validate_envelope(&raw).map(DeliveryItem::Event)
        } else if raw.get("data").is_some() {
            parse_change(&raw).map(DeliveryItem::Change)
        } else {
            Err(ValidationError::new(vec![FieldIssue::new(
                "body",
                "neither an event envelope nor a change notification",
            )]))
        };

        match result {
            Ok(item) => accepted.push(AcceptedRecord {
                index,
                delivery_id: record.delivery_id.clone(),
                item,
            }),
            Err(error) => rejected.push(RejectedRecord {
                index,
                delivery_id: record.delivery_id.clone(),
                error,
                payload: raw,
            }),
        }
    }

    BatchValidation { accepted, rejected }
}
