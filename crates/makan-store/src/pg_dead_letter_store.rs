//! `PostgreSQL` implementation of the `DeadLetterStore` trait.

use async_trait::async_trait;
use sqlx::PgPool;

use makan_core::error::PipelineError;
use makan_core::repository::{DeadLetter, DeadLetterStore};

/// PostgreSQL-backed dead-letter holding area.
#[derive(Debug, Clone)]
pub struct PgDeadLetterStore {
    pool: PgPool,
}

impl PgDeadLetterStore {
    /// Creates a new `PgDeadLetterStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_DEAD_LETTER: &str = r"
INSERT INTO dead_letters
    (letter_id, class, reason, delivery_id, payload, attempts, received_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
";

#[async_trait]
impl DeadLetterStore for PgDeadLetterStore {
    async fn push(&self, letter: DeadLetter) -> Result<(), PipelineError> {
        sqlx::query(INSERT_DEAD_LETTER)
            .bind(letter.letter_id)
            .bind(letter.class.as_str())
            .bind(&letter.reason)
            .bind(letter.delivery_id.as_deref())
            .bind(&letter.payload)
            .bind(i64::from(letter.attempts))
            .bind(letter.received_at)
            .execute(&self.pool)
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(())
    }
}
