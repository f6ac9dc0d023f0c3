//! `PostgreSQL` implementation of the `VoteStore` trait.
//!
//! The apply and retract guards run inside single statements, so the
//! idempotency and last-writer-wins checks are atomic per row even under
//! concurrent deliveries for the same `(user_id, category)` key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use makan_core::error::PipelineError;
use makan_core::repository::{ApplyOutcome, RetractOutcome, Vote, VoteStore};

/// PostgreSQL-backed vote store.
#[derive(Debug, Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    /// Creates a new `PgVoteStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct VoteRow {
    user_id: String,
    category: String,
    dish_id: String,
    rank: i64,
    cast_at: DateTime<Utc>,
    event_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VoteRow {
    fn into_vote(self) -> Result<Vote, PipelineError> {
        let rank = u32::try_from(self.rank).map_err(|_| {
            PipelineError::Transient(format!(
                "corrupt rank {} for vote ({}, {})",
                self.rank, self.user_id, self.category
            ))
        })?;
        Ok(Vote {
            user_id: self.user_id,
            category: self.category,
            dish_id: self.dish_id,
            rank,
            cast_at: self.cast_at,
            event_id: self.event_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage(error: sqlx::Error) -> PipelineError {
    PipelineError::Transient(error.to_string())
}

const SELECT_VOTE: &str = r"
SELECT user_id, category, dish_id, rank, cast_at, event_id, created_at, updated_at
FROM ranking_votes
WHERE user_id = $1 AND category = $2
";

// The WHERE clause on the conflict arm is the last-writer-wins guard: the
// update only fires when the candidate supersedes the stored row.
const APPLY_VOTE: &str = r"
INSERT INTO ranking_votes
    (user_id, category, dish_id, rank, cast_at, event_id, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (user_id, category) DO UPDATE SET
    dish_id    = EXCLUDED.dish_id,
    rank       = EXCLUDED.rank,
    cast_at    = EXCLUDED.cast_at,
    event_id   = EXCLUDED.event_id,
    updated_at = EXCLUDED.updated_at
WHERE ranking_votes.cast_at < EXCLUDED.cast_at
   OR (ranking_votes.cast_at = EXCLUDED.cast_at
       AND ranking_votes.event_id < EXCLUDED.event_id)
";

const RETRACT_VOTE: &str = r"
DELETE FROM ranking_votes
WHERE user_id = $1 AND category = $2
  AND (cast_at < $3 OR (cast_at = $3 AND event_id < $4))
RETURNING user_id, category, dish_id, rank, cast_at, event_id, created_at, updated_at
";

const SELECT_VOTES_FOR_DISH: &str = r"
SELECT user_id, category, dish_id, rank, cast_at, event_id, created_at, updated_at
FROM ranking_votes
WHERE dish_id = $1
";

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn get(&self, user_id: &str, category: &str) -> Result<Option<Vote>, PipelineError> {
        let row: Option<VoteRow> = sqlx::query_as(SELECT_VOTE)
            .bind(user_id)
            .bind(category)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(VoteRow::into_vote).transpose()
    }

    async fn apply(&self, candidate: Vote) -> Result<ApplyOutcome, PipelineError> {
        // Read first so a replaced vote can be reported; the guard in the
        // statement below stays the source of truth under races.
        let prior = self.get(&candidate.user_id, &candidate.category).await?;

        let result = sqlx::query(APPLY_VOTE)
            .bind(&candidate.user_id)
            .bind(&candidate.category)
            .bind(&candidate.dish_id)
            .bind(i64::from(candidate.rank))
            .bind(candidate.cast_at)
            .bind(&candidate.event_id)
            .bind(candidate.created_at)
            .bind(candidate.updated_at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 1 {
            return Ok(ApplyOutcome::Applied { replaced: prior });
        }

        // The guard rejected the candidate; the stored row decides which
        // no-op this was.
        let stored = self.get(&candidate.user_id, &candidate.category).await?;
        match stored {
            Some(stored) if stored.event_id == candidate.event_id => Ok(ApplyOutcome::Duplicate),
            _ => Ok(ApplyOutcome::Stale),
        }
    }

    async fn retract(
        &self,
        user_id: &str,
        category: &str,
        cast_at: DateTime<Utc>,
        event_id: &str,
    ) -> Result<RetractOutcome, PipelineError> {
        let removed: Option<VoteRow> = sqlx::query_as(RETRACT_VOTE)
            .bind(user_id)
            .bind(category)
            .bind(cast_at)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        if let Some(row) = removed {
            return Ok(RetractOutcome::Removed(row.into_vote()?));
        }
        match self.get(user_id, category).await? {
            Some(_) => Ok(RetractOutcome::Stale),
            None => Ok(RetractOutcome::Absent),
        }
    }

    async fn votes_for_dish(&self, dish_id: &str) -> Result<Vec<Vote>, PipelineError> {
        let rows: Vec<VoteRow> = sqlx::query_as(SELECT_VOTES_FOR_DISH)
            .bind(dish_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter().map(VoteRow::into_vote).collect()
    }
}
