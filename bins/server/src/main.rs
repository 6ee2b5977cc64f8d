//! SubTrack API Server
//!
//! Main entry point for the SubTrack backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subtrack_api::{ApiSettings, AppState, create_router};
use subtrack_db::connect;
use subtrack_shared::{AppConfig, EmailService, ExchangeRateClient, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subtrack=debug,tower_http=debug".into());
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database.url, config.database.max_connections).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(&config.jwt);

    let email_service = EmailService::new(config.email.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let rates_client = ExchangeRateClient::new(&config.rates)?;
    info!(
        api_url = %config.rates.api_url,
        base = %config.rates.base_currency,
        "Exchange-rate client configured"
    );

    let state = AppState::new(
        db,
        jwt_service,
        Arc::new(email_service),
        rates_client,
        ApiSettings::from_config(&config),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
