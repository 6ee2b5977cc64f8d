//! Notification batches and delivery logs.
//!
//! The partial unique index on running batches is what makes starting a
//! batch a compare-and-set: only one row may hold `status = 'running'`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS notification_logs CASCADE;
             DROP TABLE IF EXISTS notification_batches CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notification_batches (
    id UUID PRIMARY KEY,
    status VARCHAR(16) NOT NULL,
    started_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    finished_at TIMESTAMPTZ,
    due_subscriptions INTEGER NOT NULL DEFAULT 0,
    skipped_duplicates INTEGER NOT NULL DEFAULT 0,
    users_notified INTEGER NOT NULL DEFAULT 0,
    emails_sent INTEGER NOT NULL DEFAULT 0,
    emails_failed INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    CONSTRAINT chk_batch_status CHECK (status IN ('running', 'completed', 'failed'))
);

-- At most one running batch
CREATE UNIQUE INDEX uq_notification_batches_running
    ON notification_batches(status) WHERE status = 'running';

CREATE INDEX idx_notification_batches_started ON notification_batches(started_at DESC);

CREATE TABLE notification_logs (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES notification_batches(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    subscription_id UUID NOT NULL,
    billing_date DATE NOT NULL,
    recipient TEXT NOT NULL,
    template_key VARCHAR(64) NOT NULL,
    status VARCHAR(16) NOT NULL,
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_log_status CHECK (status IN ('sent', 'failed'))
);

-- Duplicate check: already sent for this billing date?
CREATE INDEX idx_notification_logs_sent
    ON notification_logs(subscription_id, billing_date) WHERE status = 'sent';

CREATE INDEX idx_notification_logs_batch ON notification_logs(batch_id);
";
