//! Producer-side vote actions and the active-vote read view.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use makan_core::envelope::{DishRetracted, DishVoted, EventKind};
use makan_ranking::application::query_handlers;

use crate::error::{ApiError, not_found};
use crate::state::AppState;

/// Request body for POST /votes.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    /// The voter.
    pub user_id: String,
    /// Correlation identifier from the caller's context, when available.
    pub trace_id: Option<String>,
    /// The dish receiving the vote.
    pub dish_id: String,
    /// The category the vote is cast in.
    pub category: String,
    /// Rating/position assigned by the voter.
    pub rank: u32,
}

/// Request body for POST /retractions.
#[derive(Debug, Deserialize)]
pub struct RetractVoteRequest {
    /// The voter.
    pub user_id: String,
    /// Correlation identifier from the caller's context, when available.
    pub trace_id: Option<String>,
    /// The category whose active vote is withdrawn.
    pub category: String,
}

/// Response body returned after an event is published.
#[derive(Debug, Serialize)]
pub struct PublishedResponse {
    /// Identifier of the published event.
    pub event_id: String,
    /// Correlation identifier stamped on the envelope.
    pub trace_id: String,
}

/// POST /votes
///
/// Publishes a `dish.voted` event. Responds 202 regardless of bus health:
/// the domain action has committed and a failed publish is preserved for
/// manual replay, never rolled back.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn cast_vote(
    State(state): State<AppState>,
    Json(request): Json<CastVoteRequest>,
) -> (StatusCode, Json<PublishedResponse>) {
    let kind = EventKind::DishVoted(DishVoted {
        dish_id: request.dish_id,
        category: request.category,
        rank: request.rank,
    });

    let envelope = state
        .publisher
        .publish(&request.user_id, request.trace_id, kind)
        .await;

    info!(event_id = %envelope.event_id, "vote event accepted");
    (
        StatusCode::ACCEPTED,
        Json(PublishedResponse {
            event_id: envelope.event_id,
            trace_id: envelope.trace_id,
        }),
    )
}

/// POST /retractions
///
/// Publishes a `dish.retracted` event under the same fire-and-forget policy
/// as vote casting.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn retract_vote(
    State(state): State<AppState>,
    Json(request): Json<RetractVoteRequest>,
) -> (StatusCode, Json<PublishedResponse>) {
    let kind = EventKind::DishRetracted(DishRetracted {
        category: request.category,
    });

    let envelope = state
        .publisher
        .publish(&request.user_id, request.trace_id, kind)
        .await;

    info!(event_id = %envelope.event_id, "retraction event accepted");
    (
        StatusCode::ACCEPTED,
        Json(PublishedResponse {
            event_id: envelope.event_id,
            trace_id: envelope.trace_id,
        }),
    )
}

/// GET /votes/{user_id}/{category}
#[instrument(skip(state))]
async fn active_vote(
    State(state): State<AppState>,
    Path((user_id, category)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let view = query_handlers::get_active_vote(&user_id, &category, state.votes.as_ref()).await?;
    match view {
        Some(view) => Ok(Json(view).into_response()),
        None => Ok(not_found(format!(
            "no active vote for user '{user_id}' in category '{category}'"
        ))),
    }
}

/// Returns the vote router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/votes", post(cast_vote))
        .route("/retractions", post(retract_vote))
        .route("/votes/{user_id}/{category}", get(active_vote))
}
