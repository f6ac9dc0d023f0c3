//! Push-based queue delivery ingestion.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use tracing::{info, instrument};

use makan_pipeline::BatchReport;
use makan_pipeline::delivery::QueueBatch;

use crate::state::AppState;

/// POST /deliveries
///
/// Processes a delivered batch record by record and reports a terminal
/// outcome for each. The response is always 200: per-record failures are
/// expressed in the report, never as a batch-level error.
#[instrument(skip(state, batch), fields(records = batch.records.len()))]
async fn ingest(
    State(state): State<AppState>,
    Json(batch): Json<QueueBatch>,
) -> Json<BatchReport> {
    let report = state.pipeline.process(&batch).await;
    info!(outcomes = report.outcomes.len(), "batch processed");
    Json(report)
}

/// Returns the delivery ingestion router.
pub fn router() -> Router<AppState> {
    Router::new().route("/deliveries", post(ingest))
}
