//! Dashboard aggregation route.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde_json::json;
use subtrack_core::aggregation::AggregationResult;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::dashboard::{AggregateRequest, aggregate_for_user};
use crate::AppState;

/// Creates the dashboard routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/aggregate", post(aggregate))
}

/// POST `/dashboard/aggregate`.
///
/// Failures keep the usual error envelope but also carry a zeroed `data`
/// payload so the dashboard can still render.
async fn aggregate(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<AggregateRequest>>,
) -> Response {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let fallback_currency = request
        .target_currency
        .clone()
        .unwrap_or_else(|| state.settings.aggregation.default_currency.clone())
        .to_ascii_uppercase();

    let result = match request.into_options(&state.settings, Utc::now().date_naive()) {
        Ok(options) => aggregate_for_user(&state, auth.user_id(), options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            let err = ApiError(e);
            err.log();
            (
                err.status(),
                Json(json!({
                    "error": err.0.error_code(),
                    "message": err.0.public_message(),
                    "data": AggregationResult::empty(&fallback_currency),
                })),
            )
                .into_response()
        }
    }
}
