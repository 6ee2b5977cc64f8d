//! Batch dispatcher.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use subtrack_shared::email::{EmailError, EmailSender};
use subtrack_shared::retry::{RetryPolicy, retry_with_backoff_if};
use subtrack_shared::types::NotificationBatchId;
use thiserror::Error;
use tracing::{error, info, warn};

use super::planner::plan_digests;
use super::store::{NotificationStore, StoreError};
use super::types::{BatchStatus, BatchSummary, DEFAULT_REMINDER_DAYS, DeliveryLog, DeliveryStatus};

/// Errors that abort a batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Another batch holds the running slot.
    #[error("A notification batch is already running")]
    AlreadyRunning,

    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Batch tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Look-ahead window in days.
    pub reminder_days: u32,
    /// Running batches older than this are considered dead.
    pub stale_after: chrono::Duration,
    /// Retry policy for each email.
    pub retry: RetryPolicy,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            reminder_days: DEFAULT_REMINDER_DAYS,
            stale_after: chrono::Duration::minutes(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs reminder batches.
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    sender: Arc<dyn EmailSender>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        store: Arc<dyn NotificationStore>,
        sender: Arc<dyn EmailSender>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            store,
            sender,
            settings,
        }
    }

    /// Runs one batch for `today`.
    ///
    /// Fails with [`DispatchError::AlreadyRunning`] without side effects when
    /// another batch is in progress. Individual delivery failures are logged
    /// and counted; they do not fail the batch. Neither does a failed
    /// delivery-log write once emails have gone out: the batch completes
    /// with the real counters and an error note.
    pub async fn run_batch(&self, today: NaiveDate) -> Result<BatchSummary, DispatchError> {
        let stale_before = Utc::now() - self.settings.stale_after;
        let failed = self.store.fail_stale_batches(stale_before).await?;
        if failed > 0 {
            warn!(failed, "Failed stale notification batches");
        }

        let Some(batch_id) = self.store.try_start_batch().await? else {
            info!("Notification batch already running, skipping");
            return Err(DispatchError::AlreadyRunning);
        };

        info!(%batch_id, %today, "Notification batch started");

        match self.process(batch_id, today).await {
            Ok(summary) => {
                let note = (summary.logs_unrecorded > 0)
                    .then(|| format!("{} delivery logs not recorded", summary.logs_unrecorded));
                self.store
                    .finish_batch(&summary, BatchStatus::Completed, note.as_deref())
                    .await?;
                info!(
                    %batch_id,
                    users = summary.users_notified,
                    sent = summary.emails_sent,
                    failed = summary.emails_failed,
                    skipped = summary.skipped_duplicates,
                    "Notification batch completed"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(%batch_id, error = %e, "Notification batch failed");
                let message = e.to_string();
                if let Err(finish_err) = self
                    .store
                    .finish_batch(&BatchSummary::new(batch_id), BatchStatus::Failed, Some(&message))
                    .await
                {
                    error!(%batch_id, error = %finish_err, "Failed to close notification batch");
                }
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        batch_id: NotificationBatchId,
        today: NaiveDate,
    ) -> Result<BatchSummary, DispatchError> {
        let until = today
            .checked_add_days(Days::new(u64::from(self.settings.reminder_days)))
            .unwrap_or(today);

        let due = self.store.due_subscriptions(today, until).await?;
        let ids: Vec<_> = due.iter().map(|d| d.subscription_id).collect();
        let already_sent = if ids.is_empty() {
            Default::default()
        } else {
            self.store.sent_reminders(&ids).await?
        };

        let mut summary = BatchSummary::new(batch_id);
        summary.due_subscriptions = due.len();

        let plan = plan_digests(due, &already_sent);
        summary.skipped_duplicates = plan.skipped_duplicates;

        let mut unrecorded: Vec<DeliveryLog> = Vec::new();

        for digest in &plan.digests {
            let request = digest.to_request();
            let result = retry_with_backoff_if(
                &self.settings.retry,
                "send_renewal_email",
                |e: &EmailError| e.is_transient(),
                |_| self.sender.send(&request),
            )
            .await;

            let (status, error) = match &result {
                Ok(()) => {
                    summary.emails_sent += 1;
                    summary.users_notified += 1;
                    (DeliveryStatus::Sent, None)
                }
                Err(e) => {
                    warn!(user_id = %digest.user_id, error = %e, "Renewal email failed");
                    summary.emails_failed += 1;
                    (DeliveryStatus::Failed, Some(e.to_string()))
                }
            };

            let logs: Vec<DeliveryLog> = digest
                .items
                .iter()
                .map(|item| DeliveryLog {
                    batch_id,
                    user_id: digest.user_id,
                    subscription_id: item.subscription_id,
                    billing_date: item.next_billing_date,
                    recipient: digest.recipient.clone(),
                    template_key: request.template_key.clone(),
                    status,
                    error: error.clone(),
                })
                .collect();
            if let Err(e) = self.store.record_deliveries(&logs).await {
                error!(user_id = %digest.user_id, error = %e, "Failed to record deliveries");
                unrecorded.extend(logs);
            }
        }

        if !unrecorded.is_empty() {
            if let Err(e) = self.store.record_deliveries(&unrecorded).await {
                error!(
                    %batch_id,
                    count = unrecorded.len(),
                    error = %e,
                    "Delivery logs lost, affected reminders may be resent"
                );
                summary.logs_unrecorded = unrecorded.len();
            }
        }

        Ok(summary)
    }
}
