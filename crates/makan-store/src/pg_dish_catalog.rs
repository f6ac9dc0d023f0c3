//! `PostgreSQL` implementation of the `DishCatalog` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use makan_core::error::PipelineError;
use makan_core::repository::{DishCatalog, DishRecord};

/// PostgreSQL-backed read-only dish catalog.
#[derive(Debug, Clone)]
pub struct PgDishCatalog {
    pool: PgPool,
}

impl PgDishCatalog {
    /// Creates a new `PgDishCatalog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DishRow {
    id: String,
    name: String,
    description: Option<String>,
    restaurant_id: String,
    restaurant_name: String,
    price: Option<f64>,
    category: Option<String>,
    tags: Vec<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_DISH: &str = r"
SELECT id, name, description, restaurant_id, restaurant_name,
       price, category, tags, image_url, created_at, updated_at
FROM dishes
WHERE id = $1
";

#[async_trait]
impl DishCatalog for PgDishCatalog {
    async fn dish(&self, dish_id: &str) -> Result<Option<DishRecord>, PipelineError> {
        let row: Option<DishRow> = sqlx::query_as(SELECT_DISH)
            .bind(dish_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(row.map(|row| DishRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            restaurant_id: row.restaurant_id,
            restaurant_name: row.restaurant_name,
            price: row.price,
            category: row.category,
            tags: row.tags,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}
