//! The dead-letter coordinator.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use makan_core::clock::Clock;
use makan_core::error::{FailureClass, PipelineError};
use makan_core::repository::{DeadLetter, DeadLetterStore};

use crate::retry::RetryPolicy;

/// Terminal disposition of one delivery processing attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Completed(T),
    /// The operation failed terminally; the delivery was captured for
    /// offline inspection and must not be redelivered.
    DeadLettered(FailureClass),
}

/// Runs delivery operations under the retry/dead-letter policy.
pub struct DeadLetterCoordinator {
    store: Arc<dyn DeadLetterStore>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl DeadLetterCoordinator {
    /// Creates a coordinator writing to `store` under `policy`.
    #[must_use]
    pub fn new(store: Arc<dyn DeadLetterStore>, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Runs `operation`, retrying transient failures with backoff up to the
    /// policy bound.
    ///
    /// Validation and business-rule failures are terminal on the first
    /// attempt; an exhausted transient failure is captured under the
    /// distinct `retry-exhausted` class so it stays distinguishable. The
    /// original `payload` is preserved verbatim in the letter.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` only when the dead-letter store
    /// itself fails; the caller should surface that to the delivery
    /// substrate so the delivery is redelivered rather than lost.
    pub async fn execute<T, F, Fut>(
        &self,
        delivery_id: Option<&str>,
        payload: &serde_json::Value,
        operation: F,
    ) -> Result<Outcome<T>, PipelineError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(Outcome::Completed(value)),
                Err(error) if error.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "transient failure, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    let class = if error.is_retryable() {
                        FailureClass::RetryExhausted
                    } else {
                        error.failure_class()
                    };
                    self.capture(class, error.to_string(), delivery_id, payload.clone(), attempt)
                        .await?;
                    return Ok(Outcome::DeadLettered(class));
                }
            }
        }
    }

    /// Captures a delivery that is known-terminal without running anything,
    /// e.g. a record that failed structural validation.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` when the dead-letter store fails.
    pub async fn dead_letter(
        &self,
        class: FailureClass,
        reason: String,
        delivery_id: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<(), PipelineError> {
        self.capture(class, reason, delivery_id, payload, 1).await
    }

    async fn capture(
        &self,
        class: FailureClass,
        reason: String,
        delivery_id: Option<&str>,
        payload: serde_json::Value,
        attempts: u32,
    ) -> Result<(), PipelineError> {
        tracing::warn!(
            class = class.as_str(),
            delivery_id = delivery_id.unwrap_or("-"),
            attempts,
            %reason,
            "delivery dead-lettered"
        );
        self.store
            .push(DeadLetter {
                letter_id: Uuid::new_v4(),
                class,
                reason,
                delivery_id: delivery_id.map(ToOwned::to_owned),
                payload,
                attempts,
                received_at: self.clock.now(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use makan_test_support::{FixedClock, RecordingDeadLetterStore};
    use serde_json::json;

    fn coordinator(store: Arc<RecordingDeadLetterStore>) -> DeadLetterCoordinator {
        DeadLetterCoordinator::new(
            store,
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(4),
            },
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            )),
        )
    }

    #[tokio::test]
    async fn test_transient_failures_retry_until_success() {
        // Arrange
        let store = Arc::new(RecordingDeadLetterStore::new());
        let coordinator = coordinator(store.clone());
        let calls = AtomicU32::new(0);

        // Act: fail twice, then succeed within the 3-attempt budget.
        let outcome = coordinator
            .execute(Some("m1"), &json!({}), || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(PipelineError::Transient("db down".into()))
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, Outcome::Completed(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(store.letters().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_retries_dead_letter_as_retry_exhausted() {
        // Arrange
        let store = Arc::new(RecordingDeadLetterStore::new());
        let coordinator = coordinator(store.clone());
        let calls = AtomicU32::new(0);
        let payload = json!({ "event_id": "e1" });

        // Act
        let outcome: Outcome<()> = coordinator
            .execute(Some("m1"), &payload, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::Transient("db down".into()))
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, Outcome::DeadLettered(FailureClass::RetryExhausted));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let letters = store.letters();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].class, FailureClass::RetryExhausted);
        assert_eq!(letters[0].attempts, 3);
        assert_eq!(letters[0].delivery_id.as_deref(), Some("m1"));
        assert_eq!(letters[0].payload, payload);
    }

    #[tokio::test]
    async fn test_business_rule_failures_are_terminal_on_first_attempt() {
        // Arrange
        let store = Arc::new(RecordingDeadLetterStore::new());
        let coordinator = coordinator(store.clone());
        let calls = AtomicU32::new(0);

        // Act
        let outcome: Outcome<()> = coordinator
            .execute(None, &json!({}), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::BusinessRule("no such dish".into()))
            })
            .await
            .unwrap();

        // Assert: no retry for terminal classes.
        assert_eq!(outcome, Outcome::DeadLettered(FailureClass::BusinessRule));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.letters()[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_dead_letter_captures_validation_rejects_verbatim() {
        // Arrange
        let store = Arc::new(RecordingDeadLetterStore::new());
        let coordinator = coordinator(store.clone());
        let payload = json!({ "not": "an envelope" });

        // Act
        coordinator
            .dead_letter(
                FailureClass::Validation,
                "event_id: missing".to_owned(),
                Some("m9"),
                payload.clone(),
            )
            .await
            .unwrap();

        // Assert
        let letters = store.letters();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].class, FailureClass::Validation);
        assert_eq!(letters[0].payload, payload);
        assert_eq!(letters[0].reason, "event_id: missing");
    }
}
