//! Shared application state.

use std::sync::Arc;

use makan_core::repository::{AggregateStore, VoteStore};
use makan_pipeline::DeliveryPipeline;
use makan_publisher::EventPublisher;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Delivery ingestion pipeline.
    pub pipeline: Arc<DeliveryPipeline>,
    /// Producer-side event publisher.
    pub publisher: Arc<EventPublisher>,
    /// Read-side seam over active votes.
    pub votes: Arc<dyn VoteStore>,
    /// Read-side seam over the derived per-dish summaries.
    pub aggregates: Arc<dyn AggregateStore>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        pipeline: Arc<DeliveryPipeline>,
        publisher: Arc<EventPublisher>,
        votes: Arc<dyn VoteStore>,
        aggregates: Arc<dyn AggregateStore>,
    ) -> Self {
        Self {
            pipeline,
            publisher,
            votes,
            aggregates,
        }
    }
}
