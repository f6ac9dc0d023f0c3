//! Per-record delivery dispatch.
//!
//! Routes validated records to the ranking aggregator and search
//! synchronizer under the dead-letter coordinator's retry policy. Every
//! record gets its own terminal outcome; a failing record never blocks or
//! poisons its siblings in the batch.

use std::sync::Arc;

use serde::Serialize;

use makan_core::envelope::{Envelope, EventKind};
use makan_core::error::{FailureClass, PipelineError};
use makan_deadletter::{DeadLetterCoordinator, Outcome};
use makan_ranking::{RankingAggregator, VoteApplication, VoteRetraction};
use makan_search::SearchSynchronizer;

use crate::delivery::{ChangeOp, ChangeRecord, QueueBatch};
use crate::middleware::{DeliveryItem, validate_batch};

/// Terminal status of one record after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Processed successfully (including no-op duplicates and stale drops).
    Completed,
    /// Captured for offline inspection; must not be redelivered.
    DeadLettered {
        /// Why the record was captured.
        class: FailureClass,
    },
    /// Could not even be captured; the substrate should redeliver.
    Retry,
}

/// Outcome of one record, attributed by batch index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// Position within the delivered batch.
    pub index: usize,
    /// Delivery identifier from the substrate.
    pub delivery_id: String,
    /// Terminal status.
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Per-record outcomes for a processed batch, in batch order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// One outcome per delivered record.
    pub outcomes: Vec<RecordOutcome>,
}

/// Dispatches validated queue records to the business handlers.
pub struct DeliveryPipeline {
    aggregator: Arc<RankingAggregator>,
    synchronizer: Arc<SearchSynchronizer>,
    coordinator: Arc<DeadLetterCoordinator>,
    dish_table: String,
}

impl DeliveryPipeline {
    /// Creates a pipeline. `dish_table` names the table whose change
    /// notifications trigger search re-indexing.
    #[must_use]
    pub fn new(
        aggregator: Arc<RankingAggregator>,
        synchronizer: Arc<SearchSynchronizer>,
        coordinator: Arc<DeadLetterCoordinator>,
        dish_table: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            synchronizer,
            coordinator,
            dish_table: dish_table.into(),
        }
    }

    /// Validates and dispatches a batch, one record at a time.
    ///
    /// Structural rejects are dead-lettered without dispatch. Valid records
    /// run under the coordinator's retry policy, so a transient storage
    /// failure on one record retries and, if exhausted, dead-letters that
    /// record alone. Outcomes come back in batch order.
    pub async fn process(&self, batch: &QueueBatch) -> BatchReport {
        let validation = validate_batch(batch);
        let mut outcomes = Vec::with_capacity(batch.records.len());

        for rejected in validation.rejected {
            let status = match self
                .coordinator
                .dead_letter(
                    FailureClass::Validation,
                    rejected.error.to_string(),
                    Some(&rejected.delivery_id),
                    rejected.payload,
                )
                .await
            {
                Ok(()) => RecordStatus::DeadLettered {
                    class: FailureClass::Validation,
                },
                Err(error) => {
                    tracing::error!(
                        delivery_id = %rejected.delivery_id,
                        %error,
                        "failed to capture rejected record, requesting redelivery"
                    );
                    RecordStatus::Retry
                }
            };
            outcomes.push(RecordOutcome {
                index: rejected.index,
                delivery_id: rejected.delivery_id,
                status,
            });
        }

        for accepted in validation.accepted {
            let status = match &accepted.item {
                DeliveryItem::Event(envelope) => {
                    self.dispatch_event(&accepted.delivery_id, envelope).await
                }
                DeliveryItem::Change(change) => {
                    self.dispatch_change(&accepted.delivery_id, change).await
                }
            };
            outcomes.push(RecordOutcome {
                index: accepted.index,
                delivery_id: accepted.delivery_id,
                status,
            });
        }

        outcomes.sort_by_key(|outcome| outcome.index);
        BatchReport { outcomes }
    }

    /// Dispatches one event in two retry scopes: the durable write first,
    /// then the aggregate/index projection for the affected dishes. A
    /// transient projection failure retries the idempotent recompute, never
    /// the already-applied event.
    async fn dispatch_event(&self, delivery_id: &str, envelope: &Envelope) -> RecordStatus {
        let payload = envelope.to_wire();
        let affected = match &envelope.kind {
            EventKind::DishVoted(vote) => {
                let applied = self
                    .coordinator
                    .execute(Some(delivery_id), &payload, || async {
                        self.aggregator.apply_vote(envelope, vote).await
                    })
                    .await;
                match applied {
                    Ok(Outcome::Completed(VoteApplication::Applied {
                        dish_id,
                        moved_from,
                    })) => {
                        let mut dishes = vec![dish_id];
                        dishes.extend(moved_from);
                        dishes
                    }
                    // A redelivery may follow a lost projection, so the
                    // duplicate still re-projects the event's dish.
                    Ok(Outcome::Completed(VoteApplication::Duplicate)) => {
                        vec![vote.dish_id.clone()]
                    }
                    Ok(Outcome::Completed(VoteApplication::Stale)) => Vec::new(),
                    Ok(Outcome::DeadLettered(class)) => {
                        return RecordStatus::DeadLettered { class };
                    }
                    Err(error) => return Self::request_redelivery(delivery_id, &error),
                }
            }
            EventKind::DishRetracted(retract) => {
                let retracted = self
                    .coordinator
                    .execute(Some(delivery_id), &payload, || async {
                        self.aggregator.retract_vote(envelope, retract).await
                    })
                    .await;
                match retracted {
                    Ok(Outcome::Completed(VoteRetraction::Removed { dish_id })) => {
                        vec![dish_id]
                    }
                    Ok(Outcome::Completed(
                        VoteRetraction::Stale | VoteRetraction::NoActiveVote,
                    )) => Vec::new(),
                    Ok(Outcome::DeadLettered(class)) => {
                        return RecordStatus::DeadLettered { class };
                    }
                    Err(error) => return Self::request_redelivery(delivery_id, &error),
                }
            }
            EventKind::UserRegistered(_) => {
                // No ranking-side state for registrations; acknowledged so
                // the substrate does not redeliver.
                tracing::debug!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    "user registration acknowledged"
                );
                return RecordStatus::Completed;
            }
        };

        if affected.is_empty() {
            return RecordStatus::Completed;
        }
        self.project(delivery_id, &payload, &affected).await
    }

    /// Recomputes and re-indexes the affected dishes under their own retry
    /// scope. Both steps are full recomputations keyed by dish id, so a
    /// retried scope converges on the same state.
    async fn project(
        &self,
        delivery_id: &str,
        payload: &serde_json::Value,
        dishes: &[String],
    ) -> RecordStatus {
        let result = self
            .coordinator
            .execute(Some(delivery_id), payload, || async {
                for dish_id in dishes {
                    self.aggregator.refresh_aggregate(dish_id).await?;
                    self.synchronizer.sync_dish(dish_id).await?;
                }
                Ok(())
            })
            .await;

        match result {
            Ok(Outcome::Completed(())) => RecordStatus::Completed,
            Ok(Outcome::DeadLettered(class)) => RecordStatus::DeadLettered { class },
            Err(error) => Self::request_redelivery(delivery_id, &error),
        }
    }

    fn request_redelivery(delivery_id: &str, error: &PipelineError) -> RecordStatus {
        tracing::error!(
            delivery_id,
            %error,
            "failed to capture failed record, requesting redelivery"
        );
        RecordStatus::Retry
    }

    async fn dispatch_change(&self, delivery_id: &str, change: &ChangeRecord) -> RecordStatus {
        if change.table != self.dish_table {
            tracing::debug!(
                table = %change.table,
                "change notification for untracked table acknowledged"
            );
            return RecordStatus::Completed;
        }
        if change.operation == ChangeOp::Remove {
            // The canonical row is gone; there is nothing left to project.
            tracing::debug!(
                entity_id = %change.entity_id,
                "dish removal acknowledged without re-indexing"
            );
            return RecordStatus::Completed;
        }

        let payload = serde_json::json!({
            "table": change.table,
            "entity_id": change.entity_id,
        });
        match self
            .coordinator
            .execute(Some(delivery_id), &payload, || async {
                self.synchronizer.sync_dish(&change.entity_id).await
            })
            .await
        {
            Ok(Outcome::Completed(())) => RecordStatus::Completed,
            Ok(Outcome::DeadLettered(class)) => RecordStatus::DeadLettered { class },
            Err(error) => Self::request_redelivery(delivery_id, &error),
        }
    }
}
