//! Durable storage abstractions for votes, aggregates, catalog metadata,
//! and dead letters.
//!
//! Every mutation behind these traits is a single atomic upsert/delete keyed
//! by a natural identifier; the storage engine's per-row atomicity is the
//! only concurrency primitive the pipeline relies on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::supersedes;
use crate::error::{FailureClass, PipelineError};

/// One user's active ranked choice within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// The voter.
    pub user_id: String,
    /// The category; `(user_id, category)` is the storage key.
    pub category: String,
    /// The dish currently holding this user's vote.
    pub dish_id: String,
    /// Rating/position assigned by the voter.
    pub rank: u32,
    /// Timestamp of the event that produced this state (last-writer-wins
    /// comparand).
    pub cast_at: DateTime<Utc>,
    /// The event that produced this state (idempotency comparand).
    pub event_id: String,
    /// When the vote row was first created.
    pub created_at: DateTime<Utc>,
    /// When the vote row was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Returns `true` when an incoming event stamped with
    /// `(cast_at, event_id)` supersedes this stored vote.
    #[must_use]
    pub fn yields_to(&self, cast_at: DateTime<Utc>, event_id: &str) -> bool {
        supersedes(cast_at, event_id, self.cast_at, &self.event_id)
    }
}

/// Result of the conditional vote apply step.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The candidate won and is now the stored state. `replaced` carries the
    /// prior vote when one existed, so callers can refresh the aggregate of
    /// a dish the vote moved away from.
    Applied {
        /// The vote that was superseded, if any.
        replaced: Option<Vote>,
    },
    /// The candidate's `event_id` is already the stored state: a redelivery.
    Duplicate,
    /// The candidate lost the last-writer-wins comparison: a stale
    /// out-of-order delivery.
    Stale,
}

/// Result of the conditional retraction step.
#[derive(Debug, Clone, PartialEq)]
pub enum RetractOutcome {
    /// The stored vote was removed.
    Removed(Vote),
    /// A stored vote exists but was written by a later event; the
    /// retraction is a stale out-of-order delivery.
    Stale,
    /// No active vote existed for the key; retraction is a no-op.
    Absent,
}

/// Derived per-dish ranking summary. Owned by the aggregator; the search
/// synchronizer only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishAggregate {
    /// The dish this summary describes.
    pub dish_id: String,
    /// Number of active votes.
    pub vote_count: i64,
    /// Mean rank across active votes; zero when no votes remain.
    pub average_rank: f64,
    /// When the summary was last recomputed.
    pub updated_at: DateTime<Utc>,
}

/// Catalog metadata for a dish, read by the business-rule check and the
/// search projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRecord {
    /// Dish identifier; doubles as the search document id.
    pub id: String,
    /// Dish name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Owning restaurant identifier.
    pub restaurant_id: String,
    /// Owning restaurant display name.
    pub restaurant_name: String,
    /// Listed price, when known.
    pub price: Option<f64>,
    /// Default category, when assigned.
    pub category: Option<String>,
    /// Descriptive tags.
    pub tags: Vec<String>,
    /// Image URL, when available.
    pub image_url: Option<String>,
    /// Creation time of the catalog row.
    pub created_at: DateTime<Utc>,
    /// Last update time of the catalog row.
    pub updated_at: DateTime<Utc>,
}

/// A delivery that could not be processed automatically, held for manual
/// inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// Identifier of this dead letter row.
    pub letter_id: Uuid,
    /// Why processing was abandoned.
    pub class: FailureClass,
    /// Human-readable failure description.
    pub reason: String,
    /// Delivery identifier from the queue substrate, when available.
    pub delivery_id: Option<String>,
    /// The original payload, preserved verbatim for replay.
    pub payload: serde_json::Value,
    /// How many processing attempts were made.
    pub attempts: u32,
    /// When the letter was captured.
    pub received_at: DateTime<Utc>,
}

/// Storage seam for active votes.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Loads the active vote for `(user_id, category)`, if any.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn get(&self, user_id: &str, category: &str) -> Result<Option<Vote>, PipelineError>;

    /// Conditionally applies `candidate` as the active vote for its key.
    ///
    /// The apply step is an atomic compare-and-update guarded by the
    /// idempotency and last-writer-wins checks; it is safe under concurrent
    /// application for the same key.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn apply(&self, candidate: Vote) -> Result<ApplyOutcome, PipelineError>;

    /// Conditionally removes the active vote for `(user_id, category)`.
    ///
    /// The removal honors the same last-writer-wins guard as `apply`: a
    /// retraction stamped `(cast_at, event_id)` only removes a stored vote
    /// it supersedes, so retractions commute with votes under arbitrary
    /// delivery order.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn retract(
        &self,
        user_id: &str,
        category: &str,
        cast_at: DateTime<Utc>,
        event_id: &str,
    ) -> Result<RetractOutcome, PipelineError>;

    /// Loads every active vote currently pointing at `dish_id`, for full
    /// aggregate recomputation.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn votes_for_dish(&self, dish_id: &str) -> Result<Vec<Vote>, PipelineError>;
}

/// Storage seam for derived per-dish summaries.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Loads the summary for a dish, if one has been computed.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn get(&self, dish_id: &str) -> Result<Option<DishAggregate>, PipelineError>;

    /// Upserts a summary keyed by dish id; repeated application converges.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn put(&self, aggregate: DishAggregate) -> Result<(), PipelineError>;
}

/// Read-only seam over the dish catalog.
#[async_trait]
pub trait DishCatalog: Send + Sync {
    /// Loads catalog metadata for a dish, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure.
    async fn dish(&self, dish_id: &str) -> Result<Option<DishRecord>, PipelineError>;
}

/// Durable holding area for deliveries that cannot be processed
/// automatically. Letters never re-enter the main processing path.
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Persists a dead letter.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` on storage failure; callers should
    /// surface that so the delivery substrate redelivers.
    async fn push(&self, letter: DeadLetter) -> Result<(), PipelineError>;
}
