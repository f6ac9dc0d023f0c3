//! Pipeline error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single structural problem found in an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// The envelope field the issue was found on.
    pub field: String,
    /// What was wrong with it.
    pub reason: String,
}

impl FieldIssue {
    /// Creates a field issue.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Structural validation failure enumerating every missing/malformed field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid envelope: {}", format_issues(.issues))]
pub struct ValidationError {
    /// All issues found, in field order encountered.
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Creates a validation error from accumulated issues.
    #[must_use]
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level pipeline error type.
///
/// Only `Transient` is eligible for retry; the other variants can never
/// become valid through redelivery and route straight to the dead-letter
/// store.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or unrecognized inbound payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structurally valid event that violates a domain invariant.
    #[error("business rule violated: {0}")]
    BusinessRule(String),

    /// Storage or downstream-service unavailability.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl PipelineError {
    /// Returns whether redelivery/retry can make this error go away.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }

    /// Returns the dead-letter classification for this error, assuming any
    /// retry budget has already been spent.
    #[must_use]
    pub fn failure_class(&self) -> FailureClass {
        match self {
            PipelineError::Validation(_) => FailureClass::Validation,
            PipelineError::BusinessRule(_) => FailureClass::BusinessRule,
            PipelineError::Transient(_) => FailureClass::TransientStorage,
        }
    }
}

/// Classification tag attached to dead-lettered deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureClass {
    /// Structural validation failure; terminal.
    Validation,
    /// Domain invariant violation; terminal.
    BusinessRule,
    /// Storage/downstream unavailability.
    TransientStorage,
    /// A transient failure that exhausted its retry budget.
    RetryExhausted,
}

impl FailureClass {
    /// Returns the wire/storage name of this class.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Validation => "validation",
            FailureClass::BusinessRule => "business-rule",
            FailureClass::TransientStorage => "transient-storage",
            FailureClass::RetryExhausted => "retry-exhausted",
        }
    }
}
