//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - JWT authentication and job-role middleware
//! - Services that load rows, run the core engines and cache results
//! - The JSON error envelope

pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use subtrack_core::cache::RequestCache;
use subtrack_core::currency::DEFAULT_BASE_CURRENCY;
use subtrack_shared::config::{AggregationConfig, NotificationConfig};
use subtrack_shared::{AppConfig, EmailSender, ExchangeRateClient, JwtService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::dashboard::AggregateCache;

/// Tunables the handlers need from the application config.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base currency of the stored rate snapshots.
    pub base_currency: String,
    /// Aggregation defaults and cache sizing.
    pub aggregation: AggregationConfig,
    /// Notification batch tuning.
    pub notification: NotificationConfig,
}

impl ApiSettings {
    /// Extracts the API settings from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_currency: config.rates.base_currency.to_ascii_uppercase(),
            aggregation: config.aggregation.clone(),
            notification: config.notification.clone(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            aggregation: AggregationConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Outgoing email transport.
    pub email_sender: Arc<dyn EmailSender>,
    /// Exchange-rate provider client.
    pub rates_client: Arc<ExchangeRateClient>,
    /// Per-user aggregation results.
    pub aggregate_cache: AggregateCache,
    /// Handler tunables.
    pub settings: Arc<ApiSettings>,
}

impl AppState {
    /// Wires the state together; the aggregate cache is sized from `settings`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        email_sender: Arc<dyn EmailSender>,
        rates_client: ExchangeRateClient,
        settings: ApiSettings,
    ) -> Self {
        let aggregate_cache = RequestCache::with_config(
            settings.aggregation.cache_capacity,
            Duration::from_secs(settings.aggregation.cache_ttl_secs),
        );
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            email_sender,
            rates_client: Arc::new(rates_client),
            aggregate_cache,
            settings: Arc::new(settings),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
