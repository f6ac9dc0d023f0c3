//! Command handlers for the ranking context.
//!
//! The aggregator is a fold over the vote event stream keyed by
//! `(user_id, category)`. It is stateless per delivery: every mutation goes
//! through the conditional apply/retract operations on the vote store, so
//! concurrent deliveries for the same key are resolved by the store's
//! per-row atomicity, never by in-process locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use makan_core::clock::Clock;
use makan_core::envelope::{DishRetracted, DishVoted, Envelope};
use makan_core::error::PipelineError;
use makan_core::repository::{
    AggregateStore, ApplyOutcome, DishCatalog, RetractOutcome, Vote, VoteStore,
};

use crate::domain::aggregates::recompute;

/// Result of applying a `dish.voted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteApplication {
    /// The vote is now the active state for its key.
    Applied {
        /// The dish that received the vote.
        dish_id: String,
        /// The dish the vote moved away from, when it changed.
        moved_from: Option<String>,
    },
    /// The event was already applied; redelivery is a no-op.
    Duplicate,
    /// The event lost the last-writer-wins comparison and was dropped.
    Stale,
}

/// Result of applying a `dish.retracted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteRetraction {
    /// The active vote was removed.
    Removed {
        /// The dish the removed vote pointed at.
        dish_id: String,
    },
    /// A later event already owns the key; the retraction was dropped.
    Stale,
    /// No active vote existed; retraction is a no-op.
    NoActiveVote,
}

/// Applies vote events, enforcing one active vote per `(user_id, category)`.
///
/// The derived per-dish summaries are not touched by `apply_vote` or
/// `retract_vote`; callers run [`RankingAggregator::refresh_aggregate`] as a
/// separate projection step, so a failed projection can be retried without
/// re-submitting the already-applied event.
pub struct RankingAggregator {
    votes: Arc<dyn VoteStore>,
    aggregates: Arc<dyn AggregateStore>,
    catalog: Arc<dyn DishCatalog>,
    clock: Arc<dyn Clock>,
    stale_drops: AtomicU64,
}

impl RankingAggregator {
    /// Creates an aggregator over the given seams.
    #[must_use]
    pub fn new(
        votes: Arc<dyn VoteStore>,
        aggregates: Arc<dyn AggregateStore>,
        catalog: Arc<dyn DishCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            votes,
            aggregates,
            catalog,
            clock,
            stale_drops: AtomicU64::new(0),
        }
    }

    /// Number of stale out-of-order deliveries silently dropped so far.
    #[must_use]
    pub fn stale_drops(&self) -> u64 {
        self.stale_drops.load(Ordering::Relaxed)
    }

    /// Applies a `dish.voted` event.
    ///
    /// A new vote for an already-voted category replaces the prior vote.
    /// Redelivered events (same `event_id`) and stale out-of-order events
    /// are no-ops; the latter increments the stale-drop counter.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::BusinessRule` when the dish does not exist in
    /// the catalog, and `PipelineError::Transient` on storage failure.
    pub async fn apply_vote(
        &self,
        envelope: &Envelope,
        vote: &DishVoted,
    ) -> Result<VoteApplication, PipelineError> {
        if self.catalog.dish(&vote.dish_id).await?.is_none() {
            return Err(PipelineError::BusinessRule(format!(
                "vote for unknown dish '{}'",
                vote.dish_id
            )));
        }

        let now = self.clock.now();
        let candidate = Vote {
            user_id: envelope.user_id.clone(),
            category: vote.category.clone(),
            dish_id: vote.dish_id.clone(),
            rank: vote.rank,
            cast_at: envelope.timestamp,
            event_id: envelope.event_id.clone(),
            created_at: now,
            updated_at: now,
        };

        match self.votes.apply(candidate).await? {
            ApplyOutcome::Applied { replaced } => {
                let moved_from = replaced
                    .filter(|prior| prior.dish_id != vote.dish_id)
                    .map(|prior| prior.dish_id);

                tracing::info!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    user_id = %envelope.user_id,
                    category = %vote.category,
                    dish_id = %vote.dish_id,
                    "vote applied"
                );
                Ok(VoteApplication::Applied {
                    dish_id: vote.dish_id.clone(),
                    moved_from,
                })
            }
            ApplyOutcome::Duplicate => {
                tracing::debug!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    "duplicate vote event ignored"
                );
                Ok(VoteApplication::Duplicate)
            }
            ApplyOutcome::Stale => {
                self.stale_drops.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    "stale out-of-order vote event dropped"
                );
                Ok(VoteApplication::Stale)
            }
        }
    }

    /// Applies a `dish.retracted` event. Retracting a never-cast vote is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    pub async fn retract_vote(
        &self,
        envelope: &Envelope,
        retract: &DishRetracted,
    ) -> Result<VoteRetraction, PipelineError> {
        let outcome = self
            .votes
            .retract(
                &envelope.user_id,
                &retract.category,
                envelope.timestamp,
                &envelope.event_id,
            )
            .await?;

        match outcome {
            RetractOutcome::Removed(removed) => {
                tracing::info!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    user_id = %envelope.user_id,
                    category = %retract.category,
                    dish_id = %removed.dish_id,
                    "vote retracted"
                );
                Ok(VoteRetraction::Removed {
                    dish_id: removed.dish_id,
                })
            }
            RetractOutcome::Stale => {
                self.stale_drops.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    event_id = %envelope.event_id,
                    trace_id = %envelope.trace_id,
                    "stale retraction dropped"
                );
                Ok(VoteRetraction::Stale)
            }
            RetractOutcome::Absent => Ok(VoteRetraction::NoActiveVote),
        }
    }

    /// Recomputes and stores a dish's summary from the full current vote
    /// set.
    ///
    /// Deriving from the complete set makes the step idempotent: it runs as
    /// the projection step after every applied mutation, on redelivery to
    /// repair a lost projection, and standalone for periodic
    /// reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    pub async fn refresh_aggregate(&self, dish_id: &str) -> Result<(), PipelineError> {
        let votes = self.votes.votes_for_dish(dish_id).await?;
        let aggregate = recompute(dish_id, &votes, self.clock.now());
        self.aggregates.put(aggregate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use makan_core::repository::AggregateStore;
    use makan_test_support::{
        FixedClock, InMemoryAggregateStore, InMemoryDishCatalog, InMemoryVoteStore,
        retract_envelope, sample_dish, vote_envelope,
    };

    fn ts(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, second).unwrap()
    }

    struct Harness {
        votes: Arc<InMemoryVoteStore>,
        aggregates: Arc<InMemoryAggregateStore>,
        aggregator: RankingAggregator,
    }

    fn harness(dish_ids: &[&str]) -> Harness {
        let votes = Arc::new(InMemoryVoteStore::new());
        let aggregates = Arc::new(InMemoryAggregateStore::new());
        let mut catalog = InMemoryDishCatalog::new();
        for dish_id in dish_ids {
            catalog = catalog.with_dish(sample_dish(dish_id));
        }
        let aggregator = RankingAggregator::new(
            votes.clone(),
            aggregates.clone(),
            Arc::new(catalog),
            Arc::new(FixedClock(ts(0))),
        );
        Harness {
            votes,
            aggregates,
            aggregator,
        }
    }

    fn vote(envelope: &Envelope) -> DishVoted {
        match &envelope.kind {
            makan_core::envelope::EventKind::DishVoted(payload) => payload.clone(),
            other => panic!("expected DishVoted, got {other:?}"),
        }
    }

    fn retraction(envelope: &Envelope) -> DishRetracted {
        match &envelope.kind {
            makan_core::envelope::EventKind::DishRetracted(payload) => payload.clone(),
            other => panic!("expected DishRetracted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_vote_is_inserted() {
        // Arrange
        let h = harness(&["d1"]);
        let envelope = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);

        // Act
        let result = h.aggregator.apply_vote(&envelope, &vote(&envelope)).await;

        // Assert
        assert_eq!(
            result.unwrap(),
            VoteApplication::Applied {
                dish_id: "d1".to_owned(),
                moved_from: None,
            }
        );
        let active = h.votes.get("u1", "nasi-lemak").await.unwrap().unwrap();
        assert_eq!(active.dish_id, "d1");
    }

    #[tokio::test]
    async fn test_refresh_aggregate_recomputes_from_the_current_vote_set() {
        // Arrange
        let h = harness(&["d1"]);
        for (event_id, user, rank) in [("e1", "u1", 1), ("e2", "u2", 3)] {
            let envelope = vote_envelope(event_id, ts(1), user, "nasi-lemak", "d1", rank);
            h.aggregator
                .apply_vote(&envelope, &vote(&envelope))
                .await
                .unwrap();
        }

        // Act
        h.aggregator.refresh_aggregate("d1").await.unwrap();

        // Assert
        let aggregate = h.aggregates.get("d1").await.unwrap().unwrap();
        assert_eq!(aggregate.vote_count, 2);
        assert!((aggregate.average_rank - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_duplicate_event_id_is_a_no_op() {
        // Arrange
        let h = harness(&["d1"]);
        let envelope = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);
        let payload = vote(&envelope);
        h.aggregator.apply_vote(&envelope, &payload).await.unwrap();
        let state_after_first = h.votes.all();

        // Act
        let result = h.aggregator.apply_vote(&envelope, &payload).await.unwrap();

        // Assert
        assert_eq!(result, VoteApplication::Duplicate);
        assert_eq!(h.votes.all(), state_after_first);
    }

    #[tokio::test]
    async fn test_reverse_delivery_converges_on_the_later_vote() {
        // The documented scenario: e1 then e2 (T2 > T1) delivered in
        // reverse order must still converge to (u1, nasi-lemak) -> d2.
        // Arrange
        let h = harness(&["d1", "d2"]);
        let first = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);
        let second = vote_envelope("e2", ts(2), "u1", "nasi-lemak", "d2", 1);

        // Act: deliver in reverse order.
        h.aggregator.apply_vote(&second, &vote(&second)).await.unwrap();
        let stale = h.aggregator.apply_vote(&first, &vote(&first)).await.unwrap();

        // Assert
        assert_eq!(stale, VoteApplication::Stale);
        let active = h.votes.get("u1", "nasi-lemak").await.unwrap().unwrap();
        assert_eq!(active.dish_id, "d2");
        assert_eq!(h.aggregator.stale_drops(), 1);
    }

    #[tokio::test]
    async fn test_timestamp_tie_is_broken_by_lexically_greater_event_id() {
        // Arrange
        let smaller = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);
        let greater = vote_envelope("e2", ts(1), "u1", "nasi-lemak", "d2", 1);

        for (a, b) in [(&smaller, &greater), (&greater, &smaller)] {
            let h = harness(&["d1", "d2"]);

            // Act: both delivery orders.
            h.aggregator.apply_vote(a, &vote(a)).await.unwrap();
            h.aggregator.apply_vote(b, &vote(b)).await.unwrap();

            // Assert: lexically smaller event_id loses deterministically.
            let active = h.votes.get("u1", "nasi-lemak").await.unwrap().unwrap();
            assert_eq!(active.dish_id, "d2");
        }
    }

    #[tokio::test]
    async fn test_new_vote_replaces_prior_and_reports_the_move() {
        // Arrange
        let h = harness(&["d1", "d2"]);
        let first = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);
        let second = vote_envelope("e2", ts(2), "u1", "nasi-lemak", "d2", 3);
        h.aggregator.apply_vote(&first, &vote(&first)).await.unwrap();

        // Act
        let result = h
            .aggregator
            .apply_vote(&second, &vote(&second))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            result,
            VoteApplication::Applied {
                dish_id: "d2".to_owned(),
                moved_from: Some("d1".to_owned()),
            }
        );
        assert_eq!(h.votes.all().len(), 1);
        let active = h.votes.get("u1", "nasi-lemak").await.unwrap().unwrap();
        assert_eq!(active.dish_id, "d2");
    }

    #[tokio::test]
    async fn test_one_active_vote_per_user_and_category() {
        // Arrange
        let h = harness(&["d1", "d2", "d3"]);
        let events = [
            vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1),
            vote_envelope("e2", ts(2), "u1", "nasi-lemak", "d2", 2),
            vote_envelope("e3", ts(3), "u1", "laksa", "d3", 1),
            vote_envelope("e4", ts(4), "u2", "nasi-lemak", "d1", 2),
            vote_envelope("e5", ts(5), "u1", "nasi-lemak", "d3", 1),
        ];

        // Act
        for envelope in &events {
            h.aggregator
                .apply_vote(envelope, &vote(envelope))
                .await
                .unwrap();
        }

        // Assert: at most one active vote per (user, category).
        let all = h.votes.all();
        assert_eq!(all.len(), 3);
        let mut keys: Vec<_> = all
            .iter()
            .map(|v| (v.user_id.clone(), v.category.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn test_vote_for_unknown_dish_is_a_business_rule_rejection() {
        // Arrange
        let h = harness(&["d1"]);
        let envelope = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d404", 1);

        // Act
        let result = h.aggregator.apply_vote(&envelope, &vote(&envelope)).await;

        // Assert
        match result.unwrap_err() {
            PipelineError::BusinessRule(reason) => assert!(reason.contains("d404")),
            other => panic!("expected BusinessRule, got {other:?}"),
        }
        assert!(h.votes.all().is_empty());
    }

    #[tokio::test]
    async fn test_retraction_removes_the_active_vote() {
        // Arrange
        let h = harness(&["d1"]);
        let cast = vote_envelope("e1", ts(1), "u1", "nasi-lemak", "d1", 1);
        h.aggregator.apply_vote(&cast, &vote(&cast)).await.unwrap();
        let retract = retract_envelope("e2", ts(2), "u1", "nasi-lemak");

        // Act
        let result = h
            .aggregator
            .retract_vote(&retract, &retraction(&retract))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            result,
            VoteRetraction::Removed {
                dish_id: "d1".to_owned(),
            }
        );
        assert!(h.votes.all().is_empty());
    }

    #[tokio::test]
    async fn test_retracting_a_never_cast_vote_is_a_no_op() {
        // Arrange
        let h = harness(&["d1"]);
        let retract = retract_envelope("e1", ts(1), "u1", "nasi-lemak");

        // Act
        let result = h
            .aggregator
            .retract_vote(&retract, &retraction(&retract))
            .await
            .unwrap();

        // Assert
        assert_eq!(result, VoteRetraction::NoActiveVote);
        assert!(h.votes.all().is_empty());
        assert!(h.aggregates.get("d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_retraction_does_not_remove_a_newer_vote() {
        // Arrange
        let h = harness(&["d1"]);
        let cast = vote_envelope("e2", ts(3), "u1", "nasi-lemak", "d1", 1);
        h.aggregator.apply_vote(&cast, &vote(&cast)).await.unwrap();
        let retract = retract_envelope("e1", ts(1), "u1", "nasi-lemak");

        // Act
        let result = h
            .aggregator
            .retract_vote(&retract, &retraction(&retract))
            .await
            .unwrap();

        // Assert
        assert_eq!(result, VoteRetraction::Stale);
        assert_eq!(h.votes.all().len(), 1);
    }
}
