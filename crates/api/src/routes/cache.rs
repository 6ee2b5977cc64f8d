//! Cache control route.

use axum::{Router, extract::State, http::StatusCode, routing::post};
use tracing::debug;

use crate::middleware::AuthUser;
use crate::services::dashboard::invalidate_user;
use crate::AppState;

/// Creates the cache routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/cache/invalidate", post(invalidate))
}

/// POST `/cache/invalidate`: drops the caller's cached aggregates.
async fn invalidate(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    invalidate_user(&state.aggregate_cache, auth.user_id());
    debug!(user_id = %auth.user_id(), "Aggregate cache invalidated");
    StatusCode::NO_CONTENT
}
