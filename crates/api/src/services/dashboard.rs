//! Dashboard aggregation with per-user result caching.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use subtrack_core::aggregation::{AggregationEngine, AggregationOptions, AggregationResult};
use subtrack_core::cache::RequestCache;
use subtrack_db::{CategoryRepository, ExchangeRateRepository, RepositoryError, SubscriptionRepository};
use subtrack_shared::AppError;
use subtrack_shared::types::UserId;
use tracing::{debug, instrument};

use super::target_currency;
use crate::error::from_shared;
use crate::{ApiSettings, AppState};

/// Longest accepted look-ahead or look-back window, in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Cache key: the caller plus every option that shapes the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    /// Caller; entries are never shared between users.
    pub user_id: UserId,
    /// Display currency.
    pub currency: String,
    /// Reference day.
    pub today: NaiveDate,
    /// Upcoming window.
    pub upcoming_days: u32,
    /// Recent window.
    pub recent_days: u32,
    /// Section flags: upcoming, recent, categories.
    pub sections: (bool, bool, bool),
}

impl AggregateKey {
    /// Builds the key for a user and options.
    #[must_use]
    pub fn new(user_id: UserId, options: &AggregationOptions) -> Self {
        Self {
            user_id,
            currency: options.target_currency.as_str().to_string(),
            today: options.today,
            upcoming_days: options.upcoming_days,
            recent_days: options.recent_days,
            sections: (
                options.include_upcoming_renewals,
                options.include_recently_paid,
                options.include_category_breakdown,
            ),
        }
    }
}

/// Aggregation results by caller and options.
pub type AggregateCache = RequestCache<AggregateKey, AggregationResult>;

/// Body of `POST /dashboard/aggregate`; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    /// Display currency.
    pub target_currency: Option<String>,
    /// Upcoming window in days.
    pub upcoming_days: Option<u32>,
    /// Recent window in days.
    pub recent_days: Option<u32>,
    /// Compute upcoming renewals.
    pub include_upcoming_renewals: Option<bool>,
    /// Compute recently paid.
    pub include_recently_paid: Option<bool>,
    /// Compute the category breakdown.
    pub include_category_breakdown: Option<bool>,
}

impl AggregateRequest {
    /// Resolves the request against the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an invalid currency code or a
    /// window longer than [`MAX_WINDOW_DAYS`].
    pub fn into_options(
        self,
        settings: &ApiSettings,
        today: NaiveDate,
    ) -> Result<AggregationOptions, AppError> {
        let target = target_currency(
            self.target_currency.as_deref(),
            &settings.aggregation.default_currency,
        )?;
        let upcoming_days = self.upcoming_days.unwrap_or(settings.aggregation.upcoming_days);
        let recent_days = self.recent_days.unwrap_or(settings.aggregation.recent_days);
        if upcoming_days > MAX_WINDOW_DAYS || recent_days > MAX_WINDOW_DAYS {
            return Err(AppError::Validation(format!(
                "Windows are limited to {MAX_WINDOW_DAYS} days"
            )));
        }

        let mut options = AggregationOptions::new(target, today);
        options.upcoming_days = upcoming_days;
        options.recent_days = recent_days;
        options.include_upcoming_renewals = self.include_upcoming_renewals.unwrap_or(true);
        options.include_recently_paid = self.include_recently_paid.unwrap_or(true);
        options.include_category_breakdown = self.include_category_breakdown.unwrap_or(true);
        Ok(options)
    }
}

/// Loads the caller's rows and the latest rate snapshot, then aggregates.
///
/// Rows are read one query after another so a single aggregation only
/// ever sees one snapshot date.
///
/// # Errors
///
/// Returns an error if any query fails.
pub async fn load_aggregate(
    db: DatabaseConnection,
    base_currency: String,
    user_id: UserId,
    options: AggregationOptions,
) -> Result<AggregationResult, RepositoryError> {
    let subscriptions = SubscriptionRepository::new(db.clone()).list_for_user(user_id).await?;
    let categories = CategoryRepository::new(db.clone())
        .categories_for_user(user_id)
        .await?;
    let snapshot = ExchangeRateRepository::new(db).latest_snapshot().await?;
    let rates = snapshot.rate_map(&base_currency);

    debug!(
        %user_id,
        subscriptions = subscriptions.len(),
        rate_date = ?snapshot.date(),
        "Aggregating dashboard"
    );
    Ok(AggregationEngine::aggregate(
        &subscriptions,
        &categories,
        &rates,
        &options,
    ))
}

/// Returns the cached aggregate or computes it once for all concurrent callers.
///
/// # Errors
///
/// Returns `AppError::Database` when loading fails.
#[instrument(skip(state, options), fields(currency = %options.target_currency))]
pub async fn aggregate_for_user(
    state: &AppState,
    user_id: UserId,
    options: AggregationOptions,
) -> Result<AggregationResult, AppError> {
    let key = AggregateKey::new(user_id, &options);
    let load = load_aggregate(
        (*state.db).clone(),
        state.settings.base_currency.clone(),
        user_id,
        options,
    );
    state
        .aggregate_cache
        .get_or_try_load(key, load)
        .await
        .map_err(from_shared)
}

/// Drops every cached aggregate of one user.
pub fn invalidate_user(cache: &AggregateCache, user_id: UserId) {
    cache.invalidate_if(move |key, _| key.user_id == user_id);
}
