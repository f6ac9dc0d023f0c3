//! Ranking pipeline database schema.

use sqlx::PgPool;

use makan_core::error::PipelineError;

/// SQL to create the active-votes table. `(user_id, category)` is the
/// primary key, so the one-vote-per-category invariant holds at the storage
/// layer.
pub const CREATE_RANKING_VOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS ranking_votes (
    user_id     VARCHAR(255) NOT NULL,
    category    VARCHAR(255) NOT NULL,
    dish_id     VARCHAR(255) NOT NULL,
    rank        BIGINT NOT NULL,
    cast_at     TIMESTAMPTZ NOT NULL,
    event_id    VARCHAR(255) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (user_id, category)
);

CREATE INDEX IF NOT EXISTS idx_ranking_votes_dish_id
    ON ranking_votes (dish_id);
";

/// SQL to create the derived per-dish summaries table.
pub const CREATE_DISH_AGGREGATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dish_aggregates (
    dish_id      VARCHAR(255) PRIMARY KEY,
    vote_count   BIGINT NOT NULL,
    average_rank DOUBLE PRECISION NOT NULL,
    updated_at   TIMESTAMPTZ NOT NULL
);
";

/// SQL to create the dish catalog table.
pub const CREATE_DISHES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dishes (
    id              VARCHAR(255) PRIMARY KEY,
    name            VARCHAR(255) NOT NULL,
    description     TEXT,
    restaurant_id   VARCHAR(255) NOT NULL,
    restaurant_name VARCHAR(255) NOT NULL,
    price           DOUBLE PRECISION,
    category        VARCHAR(255),
    tags            TEXT[] NOT NULL DEFAULT '{}',
    image_url       TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

/// SQL to create the dead-letter holding table.
pub const CREATE_DEAD_LETTERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dead_letters (
    letter_id   UUID PRIMARY KEY,
    class       VARCHAR(32) NOT NULL,
    reason      TEXT NOT NULL,
    delivery_id VARCHAR(255),
    payload     JSONB NOT NULL,
    attempts    BIGINT NOT NULL,
    received_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dead_letters_class
    ON dead_letters (class, received_at);
";

/// Creates every pipeline table if it does not already exist.
///
/// # Errors
///
/// Returns `PipelineError::Transient` when the database is unreachable.
pub async fn create_schema(pool: &PgPool) -> Result<(), PipelineError> {
    for statement in [
        CREATE_RANKING_VOTES_TABLE,
        CREATE_DISH_AGGREGATES_TABLE,
        CREATE_DISHES_TABLE,
        CREATE_DEAD_LETTERS_TABLE,
    ] {
        sqlx::raw_sql(statement)
            .execute(pool)
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
    }
    tracing::info!("database schema ensured");
    Ok(())
}
