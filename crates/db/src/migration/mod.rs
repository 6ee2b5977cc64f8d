//! Database migrations.
//!
//! Only the tables owned by this service are migrated here; the
//! subscription, rate and user tables belong to the shared schema.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_notifications;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_notifications::Migration)]
    }
}
