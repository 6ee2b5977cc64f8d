//! Batch jobs triggered by the external scheduler.

use std::sync::Arc;

use chrono::NaiveDate;
use subtrack_core::notification::{
    BatchSummary, DispatchError, DispatchSettings, NotificationDispatcher,
};
use subtrack_db::NotificationRepository;
use subtrack_shared::AppError;
use subtrack_shared::config::NotificationConfig;
use subtrack_shared::retry::RetryPolicy;

use crate::AppState;

/// Maps notification config onto dispatcher settings.
#[must_use]
pub fn dispatch_settings(config: &NotificationConfig) -> DispatchSettings {
    DispatchSettings {
        reminder_days: config.reminder_days,
        stale_after: chrono::Duration::minutes(config.stale_batch_minutes),
        retry: RetryPolicy::from_millis(config.max_attempts, config.base_delay_ms),
    }
}

/// Converts a dispatcher failure into the API taxonomy.
#[must_use]
pub fn dispatch_error(err: DispatchError) -> AppError {
    match err {
        DispatchError::AlreadyRunning => {
            AppError::AlreadyRunning("A notification batch is already running".to_string())
        }
        DispatchError::Store(e) => AppError::Database(e.to_string()),
    }
}

/// Runs one notification batch for `today`.
///
/// # Errors
///
/// Returns `AppError::AlreadyRunning` if another batch holds the slot and
/// `AppError::Database` if storage fails.
pub async fn run_notification_batch(
    state: &AppState,
    today: NaiveDate,
) -> Result<BatchSummary, AppError> {
    let store = Arc::new(NotificationRepository::new((*state.db).clone()));
    let dispatcher = NotificationDispatcher::new(
        store,
        Arc::clone(&state.email_sender),
        dispatch_settings(&state.settings.notification),
    );
    dispatcher.run_batch(today).await.map_err(dispatch_error)
}
