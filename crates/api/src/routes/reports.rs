//! Expense report route.

use axum::{Json, Router, extract::State, routing::post};
use subtrack_core::reports::ExpenseReport;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::reports::{ExpenseReportRequest, expense_report};
use crate::AppState;

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/expenses", post(expenses))
}

/// POST `/reports/expenses`.
async fn expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ExpenseReportRequest>,
) -> Result<Json<ExpenseReport>, ApiError> {
    let report = expense_report(&state.db, &state.settings, auth.user_id(), &body).await?;
    Ok(Json(report))
}
