//! Read-side ranking views.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use tracing::instrument;

use makan_ranking::application::query_handlers;

use crate::error::{ApiError, not_found};
use crate::state::AppState;

/// GET /rankings/{dish_id}
#[instrument(skip(state))]
async fn dish_ranking(
    State(state): State<AppState>,
    Path(dish_id): Path<String>,
) -> Result<Response, ApiError> {
    let view = query_handlers::get_dish_ranking(&dish_id, state.aggregates.as_ref()).await?;
    match view {
        Some(view) => Ok(Json(view).into_response()),
        None => Ok(not_found(format!("no ranking for dish '{dish_id}'"))),
    }
}

/// Returns the rankings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/rankings/{dish_id}", get(dish_ranking))
}
