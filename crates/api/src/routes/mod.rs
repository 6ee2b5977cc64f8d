//! API route definitions.

use axum::{Router, middleware};

use crate::AppState;
use crate::middleware::{auth_middleware, require_job_role};

pub mod cache;
pub mod dashboard;
pub mod exchange_rates;
pub mod health;
pub mod jobs;
pub mod reports;


/// Creates the API router; everything except health requires a valid token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let job_routes = jobs::routes().layer(middleware::from_fn(require_job_role));

    let protected_routes = Router::new()
        .merge(dashboard::routes())
        .merge(reports::routes())
        .merge(exchange_rates::routes())
        .merge(cache::routes())
        .merge(job_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
