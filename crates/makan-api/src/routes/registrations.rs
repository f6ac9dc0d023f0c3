//! Producer-side user registration emission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};

use makan_core::envelope::{EventKind, UserRegistered};

use crate::routes::votes::PublishedResponse;
use crate::state::AppState;

/// Request body for POST /registrations.
#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    /// Identifier of the registered user.
    pub user_id: String,
    /// Correlation identifier from the caller's context, when available.
    pub trace_id: Option<String>,
    /// Display name chosen at registration.
    pub username: String,
    /// Registered email, when the identity provider shares it.
    pub email: Option<String>,
}

/// POST /registrations
///
/// Publishes a `user.registered` event under the fire-and-forget policy.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> (StatusCode, Json<PublishedResponse>) {
    let kind = EventKind::UserRegistered(UserRegistered {
        username: request.username,
        email: request.email,
    });

    let envelope = state
        .publisher
        .publish(&request.user_id, request.trace_id, kind)
        .await;

    info!(event_id = %envelope.event_id, "registration event accepted");
    (
        StatusCode::ACCEPTED,
        Json(PublishedResponse {
            event_id: envelope.event_id,
            trace_id: envelope.trace_id,
        }),
    )
}

/// Returns the registration router.
pub fn router() -> Router<AppState> {
    Router::new().route("/registrations", post(register))
}
