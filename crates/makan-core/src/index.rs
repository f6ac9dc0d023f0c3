//! Search index abstraction and the denormalized document schema.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The denormalized, index-optimized representation of a dish.
///
/// Always derivable by replay from the aggregate ranking view plus catalog
/// metadata; never a second source of truth. Missing optional source
/// attributes are substituted with the defaults below rather than failing
/// the upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Document identifier; equals the dish identifier so repeated upserts
    /// converge.
    pub id: String,
    /// Dish name.
    pub name: String,
    /// Free-text description; empty string when unknown.
    pub description: String,
    /// Owning restaurant identifier.
    pub restaurant_id: String,
    /// Owning restaurant display name.
    pub restaurant_name: String,
    /// Listed price; zero when unknown.
    pub price: f64,
    /// Category; empty string when unassigned.
    pub category: String,
    /// Descriptive tags; empty set when none.
    pub tags: BTreeSet<String>,
    /// Mean rank across active votes; the default sort field.
    pub rating: f64,
    /// Number of active votes.
    pub review_count: i64,
    /// Image URL; empty string when unavailable.
    pub image_url: String,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last update time, epoch milliseconds.
    pub updated_at: i64,
}

/// Seam over the search store.
#[async_trait]
pub trait SearchIndexWriter: Send + Sync {
    /// Idempotently upserts documents keyed by `id`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` when the index is unreachable.
    async fn upsert(&self, documents: &[SearchDocument]) -> Result<(), PipelineError>;
}
