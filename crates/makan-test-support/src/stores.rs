//! In-memory and failing storage doubles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use makan_core::error::PipelineError;
use chrono::{DateTime, Utc};
use makan_core::repository::{
    AggregateStore, ApplyOutcome, DeadLetter, DeadLetterStore, DishAggregate, DishCatalog,
    DishRecord, RetractOutcome, Vote, VoteStore,
};

/// A `VoteStore` backed by a mutex-guarded map, honoring the same
/// idempotency and last-writer-wins guard contract as the durable
/// implementation.
#[derive(Debug, Default)]
pub struct InMemoryVoteStore {
    votes: Mutex<HashMap<(String, String), Vote>>,
}

impl InMemoryVoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all active votes, for invariant assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn all(&self) -> Vec<Vote> {
        self.votes.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl VoteStore for InMemoryVoteStore {
    async fn get(&self, user_id: &str, category: &str) -> Result<Option<Vote>, PipelineError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .get(&(user_id.to_owned(), category.to_owned()))
            .cloned())
    }

    async fn apply(&self, candidate: Vote) -> Result<ApplyOutcome, PipelineError> {
        let key = (candidate.user_id.clone(), candidate.category.clone());
        let mut votes = self.votes.lock().unwrap();

        match votes.get(&key) {
            None => {
                votes.insert(key, candidate);
                Ok(ApplyOutcome::Applied { replaced: None })
            }
            Some(current) if current.event_id == candidate.event_id => Ok(ApplyOutcome::Duplicate),
            Some(current) if current.yields_to(candidate.cast_at, &candidate.event_id) => {
                let replaced = current.clone();
                let mut next = candidate;
                next.created_at = replaced.created_at;
                votes.insert(key, next);
                Ok(ApplyOutcome::Applied {
                    replaced: Some(replaced),
                })
            }
            Some(_) => Ok(ApplyOutcome::Stale),
        }
    }

    async fn retract(
        &self,
        user_id: &str,
        category: &str,
        cast_at: DateTime<Utc>,
        event_id: &str,
    ) -> Result<RetractOutcome, PipelineError> {
        let key = (user_id.to_owned(), category.to_owned());
        let mut votes = self.votes.lock().unwrap();

        match votes.get(&key) {
            None => Ok(RetractOutcome::Absent),
            Some(current) if current.yields_to(cast_at, event_id) => {
                let removed = votes.remove(&key).expect("key checked above");
                Ok(RetractOutcome::Removed(removed))
            }
            Some(_) => Ok(RetractOutcome::Stale),
        }
    }

    async fn votes_for_dish(&self, dish_id: &str) -> Result<Vec<Vote>, PipelineError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .values()
            .filter(|vote| vote.dish_id == dish_id)
            .cloned()
            .collect())
    }
}

/// A `VoteStore` that always fails with a transient error, for retry and
/// exhaustion tests.
#[derive(Debug, Default)]
pub struct FailingVoteStore;

#[async_trait]
impl VoteStore for FailingVoteStore {
    async fn get(&self, _user_id: &str, _category: &str) -> Result<Option<Vote>, PipelineError> {
        Err(PipelineError::Transient("connection refused".into()))
    }

    async fn apply(&self, _candidate: Vote) -> Result<ApplyOutcome, PipelineError> {
        Err(PipelineError::Transient("connection refused".into()))
    }

    async fn retract(
        &self,
        _user_id: &str,
        _category: &str,
        _cast_at: DateTime<Utc>,
        _event_id: &str,
    ) -> Result<RetractOutcome, PipelineError> {
        Err(PipelineError::Transient("connection refused".into()))
    }

    async fn votes_for_dish(&self, _dish_id: &str) -> Result<Vec<Vote>, PipelineError> {
        Err(PipelineError::Transient("connection refused".into()))
    }
}

/// An `AggregateStore` backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    aggregates: Mutex<HashMap<String, DishAggregate>>,
}

impl InMemoryAggregateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn get(&self, dish_id: &str) -> Result<Option<DishAggregate>, PipelineError> {
        Ok(self.aggregates.lock().unwrap().get(dish_id).cloned())
    }

    async fn put(&self, aggregate: DishAggregate) -> Result<(), PipelineError> {
        self.aggregates
            .lock()
            .unwrap()
            .insert(aggregate.dish_id.clone(), aggregate);
        Ok(())
    }
}

/// A `DishCatalog` backed by a fixed set of records.
#[derive(Debug, Default)]
pub struct InMemoryDishCatalog {
    dishes: HashMap<String, DishRecord>,
}

impl InMemoryDishCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dish to the catalog.
    #[must_use]
    pub fn with_dish(mut self, dish: DishRecord) -> Self {
        self.dishes.insert(dish.id.clone(), dish);
        self
    }
}

#[async_trait]
impl DishCatalog for InMemoryDishCatalog {
    async fn dish(&self, dish_id: &str) -> Result<Option<DishRecord>, PipelineError> {
        Ok(self.dishes.get(dish_id).cloned())
    }
}

/// A `DeadLetterStore` that records every pushed letter.
#[derive(Debug, Default)]
pub struct RecordingDeadLetterStore {
    letters: Mutex<Vec<DeadLetter>>,
}

impl RecordingDeadLetterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all captured letters.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterStore for RecordingDeadLetterStore {
    async fn push(&self, letter: DeadLetter) -> Result<(), PipelineError> {
        self.letters.lock().unwrap().push(letter);
        Ok(())
    }
}
