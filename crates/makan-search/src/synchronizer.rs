//! The search index synchronizer.

use std::sync::Arc;

use makan_core::error::PipelineError;
use makan_core::index::SearchIndexWriter;
use makan_core::repository::{AggregateStore, DishCatalog};

use crate::projection::project;

/// Keeps the search index eventually consistent with the aggregate ranking
/// view. Reads canonical state, projects, and upserts idempotently: the
/// document id equals the dish id, so repeated application converges.
pub struct SearchSynchronizer {
    catalog: Arc<dyn DishCatalog>,
    aggregates: Arc<dyn AggregateStore>,
    index: Arc<dyn SearchIndexWriter>,
}

impl SearchSynchronizer {
    /// Creates a synchronizer over the given seams.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn DishCatalog>,
        aggregates: Arc<dyn AggregateStore>,
        index: Arc<dyn SearchIndexWriter>,
    ) -> Self {
        Self {
            catalog,
            aggregates,
            index,
        }
    }

    /// Re-projects one dish into the index from its current canonical
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::BusinessRule` when the dish is not in the
    /// catalog, and `PipelineError::Transient` on storage or index failure.
    pub async fn sync_dish(&self, dish_id: &str) -> Result<(), PipelineError> {
        let Some(dish) = self.catalog.dish(dish_id).await? else {
            return Err(PipelineError::BusinessRule(format!(
                "cannot index unknown dish '{dish_id}'"
            )));
        };
        let aggregate = self.aggregates.get(dish_id).await?;

        let document = project(&dish, aggregate.as_ref());
        self.index.upsert(std::slice::from_ref(&document)).await?;

        tracing::debug!(
            dish_id = %dish_id,
            rating = document.rating,
            review_count = document.review_count,
            "search document upserted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use makan_core::repository::DishAggregate;
    use makan_test_support::{
        InMemoryAggregateStore, InMemoryDishCatalog, RecordingIndexWriter, sample_dish,
    };

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn synchronizer_with(
        catalog: InMemoryDishCatalog,
        aggregates: Arc<InMemoryAggregateStore>,
        index: Arc<RecordingIndexWriter>,
    ) -> SearchSynchronizer {
        SearchSynchronizer::new(Arc::new(catalog), aggregates, index)
    }

    #[tokio::test]
    async fn test_sync_dish_upserts_the_projected_document() {
        // Arrange
        let catalog = InMemoryDishCatalog::new().with_dish(sample_dish("d1"));
        let aggregates = Arc::new(InMemoryAggregateStore::new());
        aggregates
            .put(DishAggregate {
                dish_id: "d1".to_owned(),
                vote_count: 2,
                average_rank: 1.5,
                updated_at: fixed_now(),
            })
            .await
            .unwrap();
        let index = Arc::new(RecordingIndexWriter::new());
        let synchronizer = synchronizer_with(catalog, aggregates, index.clone());

        // Act
        synchronizer.sync_dish("d1").await.unwrap();

        // Assert
        let document = index.document("d1").expect("document should be indexed");
        assert_eq!(document.review_count, 2);
        assert!((document.rating - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent_per_document_id() {
        // Arrange
        let catalog = InMemoryDishCatalog::new().with_dish(sample_dish("d1"));
        let aggregates = Arc::new(InMemoryAggregateStore::new());
        let index = Arc::new(RecordingIndexWriter::new());
        let synchronizer = synchronizer_with(catalog, aggregates, index.clone());

        // Act
        synchronizer.sync_dish("d1").await.unwrap();
        synchronizer.sync_dish("d1").await.unwrap();

        // Assert: repeated application converges, not accumulates.
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_sync_of_unknown_dish_is_a_business_rule_rejection() {
        // Arrange
        let catalog = InMemoryDishCatalog::new();
        let aggregates = Arc::new(InMemoryAggregateStore::new());
        let index = Arc::new(RecordingIndexWriter::new());
        let synchronizer = synchronizer_with(catalog, aggregates, index.clone());

        // Act
        let result = synchronizer.sync_dish("d404").await;

        // Assert
        match result.unwrap_err() {
            PipelineError::BusinessRule(reason) => assert!(reason.contains("d404")),
            other => panic!("expected BusinessRule, got {other:?}"),
        }
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_dish_without_aggregate_indexes_with_zero_rating() {
        // Arrange
        let catalog = InMemoryDishCatalog::new().with_dish(sample_dish("d1"));
        let aggregates = Arc::new(InMemoryAggregateStore::new());
        let index = Arc::new(RecordingIndexWriter::new());
        let synchronizer = synchronizer_with(catalog, aggregates, index.clone());

        // Act
        synchronizer.sync_dish("d1").await.unwrap();

        // Assert
        let document = index.document("d1").unwrap();
        assert_eq!(document.review_count, 0);
        assert!((document.rating - 0.0).abs() < f64::EPSILON);
    }
}
