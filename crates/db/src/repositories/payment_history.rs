//! Payment history repository (read-only).

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use subtrack_core::billing::sanitize_amount;
use subtrack_core::payments::{PaymentRecord, PaymentStatus};
use subtrack_shared::types::{CurrencyCode, UserId};

use super::error::RepositoryError;
use super::subscription::decode_all;
use crate::entities::payment_history;

/// Decodes a stored payment row.
pub fn decode_payment(model: payment_history::Model) -> Result<PaymentRecord, RepositoryError> {
    let currency = CurrencyCode::parse(&model.currency)
        .map_err(|e| RepositoryError::decode("payment_history", model.id, e.to_string()))?;
    let status = model
        .status
        .parse::<PaymentStatus>()
        .map_err(|e| RepositoryError::decode("payment_history", model.id, e))?;

    Ok(PaymentRecord {
        id: model.id.into(),
        subscription_id: model.subscription_id.into(),
        payment_date: model.payment_date,
        amount_paid: sanitize_amount(model.amount_paid, &model.id.to_string()),
        currency,
        billing_period_start: model.billing_period_start,
        billing_period_end: model.billing_period_end,
        status,
        notes: model.notes,
    })
}

/// Payment history repository.
#[derive(Debug, Clone)]
pub struct PaymentHistoryRepository {
    db: DatabaseConnection,
}

impl PaymentHistoryRepository {
    /// Creates a new payment history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Payments of a user dated within `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let models = payment_history::Entity::find()
            .filter(payment_history::Column::UserId.eq(user_id.into_inner()))
            .filter(payment_history::Column::PaymentDate.between(start, end))
            .order_by_asc(payment_history::Column::PaymentDate)
            .all(&self.db)
            .await?;

        Ok(decode_all(models, decode_payment))
    }
}
