//! Database migration runner for SubTrack.
//!
//! Only the notification tables are owned here. Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!
//! The connection string is read from `DATABASE_URL`.

use sea_orm_migration::prelude::*;
use subtrack_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
