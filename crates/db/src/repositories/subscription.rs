//! Subscription repository.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use subtrack_core::billing::{BillingCycle, sanitize_amount};
use subtrack_core::subscription::{Subscription, SubscriptionStatus};
use subtrack_shared::types::{CurrencyCode, UserId};
use tracing::warn;

use super::error::RepositoryError;
use crate::entities::{subscriptions, users};

/// Decodes a stored row into a [`Subscription`].
///
/// A missing or negative amount becomes zero; an unknown billing cycle is
/// kept as-is. Invalid currency codes and unknown statuses are errors.
pub fn decode_subscription(model: subscriptions::Model) -> Result<Subscription, RepositoryError> {
    let context = model.id.to_string();
    let currency = CurrencyCode::parse(&model.currency)
        .map_err(|e| RepositoryError::decode("subscriptions", model.id, e.to_string()))?;
    let status = model
        .status
        .parse::<SubscriptionStatus>()
        .map_err(|e| RepositoryError::decode("subscriptions", model.id, e))?;

    Ok(Subscription {
        id: model.id.into(),
        user_id: model.user_id.into(),
        name: model.name,
        amount: sanitize_amount(model.amount, &context),
        currency,
        billing_cycle: BillingCycle::parse(&model.billing_cycle),
        status,
        next_billing_date: model.next_billing_date,
        last_billing_date: model.last_billing_date,
        start_date: model.start_date,
        category_id: model.category_id.map(Into::into),
        payment_method_id: model.payment_method_id.map(Into::into),
    })
}

/// Decodes every row, logging and dropping the ones that fail.
pub(crate) fn decode_all<M, T>(
    models: Vec<M>,
    decode: impl Fn(M) -> Result<T, RepositoryError>,
) -> Vec<T> {
    models
        .into_iter()
        .filter_map(|model| match decode(model) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable row");
                None
            }
        })
        .collect()
}

/// Subscription repository.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: DatabaseConnection,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists every subscription of a user, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Subscription>, RepositoryError> {
        let models = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(subscriptions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(decode_all(models, decode_subscription))
    }

    /// Active subscriptions renewing in `[from, to]`, each with its owner's email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn due_with_owner(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(Subscription, Option<String>)>, RepositoryError> {
        let rows = subscriptions::Entity::find()
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::NextBillingDate.between(from, to))
            .order_by_asc(subscriptions::Column::NextBillingDate)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(decode_all(rows, |(model, owner)| {
            let email = owner.and_then(|u| u.email);
            decode_subscription(model).map(|sub| (sub, email))
        }))
    }
}
