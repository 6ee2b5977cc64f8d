//! Persistence seam for notification batches.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use subtrack_shared::types::{NotificationBatchId, SubscriptionId};
use thiserror::Error;

use super::types::{BatchStatus, BatchSummary, DeliveryLog, DueSubscription};

/// Storage failure, message only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Notification store error: {0}")]
pub struct StoreError(pub String);

/// What the dispatcher needs from storage.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Marks running batches started before `started_before` as failed.
    /// Returns how many were failed.
    async fn fail_stale_batches(&self, started_before: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Starts a batch unless one is already running (compare-and-set).
    /// Returns `None` when another batch holds the slot.
    async fn try_start_batch(&self) -> Result<Option<NotificationBatchId>, StoreError>;

    /// Active subscriptions with `next_billing_date` in `[from, to]` and the owner's email.
    async fn due_subscriptions(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueSubscription>, StoreError>;

    /// Keys of reminders already delivered for these subscriptions.
    async fn sent_reminders(
        &self,
        subscription_ids: &[SubscriptionId],
    ) -> Result<HashSet<(SubscriptionId, NaiveDate)>, StoreError>;

    /// Appends delivery audit rows.
    async fn record_deliveries(&self, logs: &[DeliveryLog]) -> Result<(), StoreError>;

    /// Closes the batch with final counters.
    async fn finish_batch(
        &self,
        summary: &BatchSummary,
        status: BatchStatus,
        error: Option<&str>,
    ) -> Result<(), StoreError>;
}
