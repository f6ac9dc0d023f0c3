//! Liveness endpoint.
//!
//! Deliberately shallow: it reports that the server is accepting requests
//! and which pipeline version is running, without touching the database or
//! the search index.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Liveness report.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server can answer at all.
    pub status: String,
    /// Crate version of the running binary.
    pub version: String,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
    })
}

/// Router for the unversioned liveness probe.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
