//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Liveness report; always served with 200.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// `up` or `down`.
    pub database: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "up",
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            "down"
        }
    };
    Json(HealthResponse {
        status: if database == "up" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
