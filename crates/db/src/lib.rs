//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the subscription schema
//! - Repositories that decode rows into core domain types
//! - Migrations for the notification tables

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    CategoryRepository, ExchangeRateRepository, NotificationRepository, PaymentHistoryRepository,
    RepositoryError, SubscriptionRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options.max_connections(max_connections).sqlx_logging(false);
    Database::connect(options).await
}
