//! Batch job routes for the external scheduler.
//!
//! Mounted behind `require_job_role`, so only admin and service tokens
//! reach these handlers.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use subtrack_core::notification::BatchSummary;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::jobs::run_notification_batch;
use crate::services::rates::{RateUpdateSummary, run_rate_update};
use crate::AppState;

/// Creates the job routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/exchange-rates", post(update_exchange_rates))
        .route("/jobs/notifications", post(send_notifications))
}

/// POST `/jobs/exchange-rates`.
async fn update_exchange_rates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<RateUpdateSummary>, ApiError> {
    info!(role = auth.role().as_str(), "Rate update triggered");
    let summary = run_rate_update(&state.db, &state.rates_client, "scheduled").await?;
    // Cached aggregates were computed with the previous snapshot.
    state.aggregate_cache.invalidate_all();
    Ok(Json(summary))
}

/// POST `/jobs/notifications`; `409 already_running` while a batch is in progress.
async fn send_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BatchSummary>, ApiError> {
    info!(role = auth.role().as_str(), "Notification batch triggered");
    let summary = run_notification_batch(&state, Utc::now().date_naive()).await?;
    Ok(Json(summary))
}
