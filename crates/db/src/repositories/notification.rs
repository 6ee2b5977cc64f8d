//! Notification batch and delivery-log repository.
//!
//! Implements [`NotificationStore`] on top of the `notification_batches`
//! and `notification_logs` tables. The running slot is guarded by the
//! partial unique index `uq_notification_batches_running`, so starting a
//! batch is a single insert that either wins or hits the constraint.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use subtrack_core::notification::{
    BatchStatus, BatchSummary, DeliveryLog, DeliveryStatus, DueSubscription, NotificationStore,
    StoreError,
};
use subtrack_shared::types::{NotificationBatchId, SubscriptionId};
use tracing::debug;
use uuid::Uuid;

use super::error::RepositoryError;
use super::subscription::SubscriptionRepository;
use crate::entities::{notification_batches, notification_logs};

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        Self(err.to_string())
    }
}

fn store_err(err: DbErr) -> StoreError {
    RepositoryError::from(err).into()
}

fn count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
    subscriptions: SubscriptionRepository,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            subscriptions: SubscriptionRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn fail_stale_batches(&self, started_before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = notification_batches::Entity::update_many()
            .col_expr(
                notification_batches::Column::Status,
                Expr::value(BatchStatus::Failed.as_str()),
            )
            .col_expr(
                notification_batches::Column::FinishedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .col_expr(
                notification_batches::Column::Error,
                Expr::value("stale running batch"),
            )
            .filter(notification_batches::Column::Status.eq(BatchStatus::Running.as_str()))
            .filter(notification_batches::Column::StartedAt.lt(started_before.fixed_offset()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected)
    }

    async fn try_start_batch(&self) -> Result<Option<NotificationBatchId>, StoreError> {
        let id = NotificationBatchId::new();
        let batch = notification_batches::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(BatchStatus::Running.as_str().to_string()),
            started_at: Set(Utc::now().fixed_offset()),
            finished_at: Set(None),
            due_subscriptions: Set(0),
            skipped_duplicates: Set(0),
            users_notified: Set(0),
            emails_sent: Set(0),
            emails_failed: Set(0),
            error: Set(None),
        };

        match notification_batches::Entity::insert(batch)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(Some(id)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Running batch slot taken");
                Ok(None)
            }
            Err(e) => Err(store_err(e)),
        }
    }

    async fn due_subscriptions(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueSubscription>, StoreError> {
        let rows = self.subscriptions.due_with_owner(from, to).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(sub, email)| {
                let next_billing_date = sub.next_billing_date?;
                Some(DueSubscription {
                    subscription_id: sub.id,
                    user_id: sub.user_id,
                    recipient: email.unwrap_or_default(),
                    name: sub.name,
                    amount: sub.amount,
                    currency: sub.currency,
                    billing_cycle: sub.billing_cycle,
                    next_billing_date,
                })
            })
            .collect())
    }

    async fn sent_reminders(
        &self,
        subscription_ids: &[SubscriptionId],
    ) -> Result<HashSet<(SubscriptionId, NaiveDate)>, StoreError> {
        let ids: Vec<Uuid> = subscription_ids.iter().map(|id| id.into_inner()).collect();
        let logs = notification_logs::Entity::find()
            .filter(notification_logs::Column::SubscriptionId.is_in(ids))
            .filter(notification_logs::Column::Status.eq(DeliveryStatus::Sent.as_str()))
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok(logs
            .into_iter()
            .map(|log| (log.subscription_id.into(), log.billing_date))
            .collect())
    }

    async fn record_deliveries(&self, logs: &[DeliveryLog]) -> Result<(), StoreError> {
        if logs.is_empty() {
            return Ok(());
        }
        let now = Utc::now().fixed_offset();
        let models = logs.iter().map(|log| notification_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            batch_id: Set(log.batch_id.into_inner()),
            user_id: Set(log.user_id.into_inner()),
            subscription_id: Set(log.subscription_id.into_inner()),
            billing_date: Set(log.billing_date),
            recipient: Set(log.recipient.clone()),
            template_key: Set(log.template_key.clone()),
            status: Set(log.status.as_str().to_string()),
            error: Set(log.error.clone()),
            created_at: Set(now),
        });

        notification_logs::Entity::insert_many(models)
            .exec_without_returning(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn finish_batch(
        &self,
        summary: &BatchSummary,
        status: BatchStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        notification_batches::Entity::update_many()
            .col_expr(notification_batches::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                notification_batches::Column::FinishedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .col_expr(
                notification_batches::Column::DueSubscriptions,
                Expr::value(count(summary.due_subscriptions)),
            )
            .col_expr(
                notification_batches::Column::SkippedDuplicates,
                Expr::value(count(summary.skipped_duplicates)),
            )
            .col_expr(
                notification_batches::Column::UsersNotified,
                Expr::value(count(summary.users_notified)),
            )
            .col_expr(
                notification_batches::Column::EmailsSent,
                Expr::value(count(summary.emails_sent)),
            )
            .col_expr(
                notification_batches::Column::EmailsFailed,
                Expr::value(count(summary.emails_failed)),
            )
            .col_expr(
                notification_batches::Column::Error,
                Expr::value(error.map(str::to_string)),
            )
            .filter(notification_batches::Column::Id.eq(summary.batch_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
