//! `PostgreSQL` implementation of the `AggregateStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use makan_core::error::PipelineError;
use makan_core::repository::{AggregateStore, DishAggregate};

/// PostgreSQL-backed store for the derived per-dish summaries.
#[derive(Debug, Clone)]
pub struct PgAggregateStore {
    pool: PgPool,
}

impl PgAggregateStore {
    /// Creates a new `PgAggregateStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AggregateRow {
    dish_id: String,
    vote_count: i64,
    average_rank: f64,
    updated_at: DateTime<Utc>,
}

const SELECT_AGGREGATE: &str = r"
SELECT dish_id, vote_count, average_rank, updated_at
FROM dish_aggregates
WHERE dish_id = $1
";

const UPSERT_AGGREGATE: &str = r"
INSERT INTO dish_aggregates (dish_id, vote_count, average_rank, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (dish_id) DO UPDATE SET
    vote_count   = EXCLUDED.vote_count,
    average_rank = EXCLUDED.average_rank,
    updated_at   = EXCLUDED.updated_at
";

#[async_trait]
impl AggregateStore for PgAggregateStore {
    async fn get(&self, dish_id: &str) -> Result<Option<DishAggregate>, PipelineError> {
        let row: Option<AggregateRow> = sqlx::query_as(SELECT_AGGREGATE)
            .bind(dish_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(row.map(|row| DishAggregate {
            dish_id: row.dish_id,
            vote_count: row.vote_count,
            average_rank: row.average_rank,
            updated_at: row.updated_at,
        }))
    }

    async fn put(&self, aggregate: DishAggregate) -> Result<(), PipelineError> {
        sqlx::query(UPSERT_AGGREGATE)
            .bind(&aggregate.dish_id)
            .bind(aggregate.vote_count)
            .bind(aggregate.average_rank)
            .bind(aggregate.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(())
    }
}
