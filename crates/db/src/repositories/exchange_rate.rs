//! Exchange rate repository.
//!
//! Rates are stored as one snapshot per provider date. Readers only ever
//! see the most recent snapshot, so one aggregation never mixes dates.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use subtrack_core::currency::{ExchangeRate, ExchangeRateSnapshot};
use subtrack_shared::FetchedRate;
use uuid::Uuid;

use super::error::RepositoryError;
use super::subscription::decode_all;
use crate::entities::{exchange_rate_update_logs, exchange_rates};

/// Outcome of a rate update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUpdateStatus {
    /// Every rate stored.
    Success,
    /// Fetch or store failed.
    Failed,
}

impl RateUpdateStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Audit entry for one rate update run.
#[derive(Debug, Clone)]
pub struct RateUpdateLog {
    /// `scheduled` or `manual`.
    pub update_type: String,
    /// Outcome.
    pub status: RateUpdateStatus,
    /// Rows written.
    pub rates_updated: usize,
    /// Failure detail.
    pub error_message: Option<String>,
    /// Run start.
    pub started_at: DateTime<Utc>,
}

/// Decodes a stored rate row.
pub fn decode_rate(model: exchange_rates::Model) -> Result<ExchangeRate, RepositoryError> {
    if model.rate.is_sign_negative() || model.rate.is_zero() {
        return Err(RepositoryError::decode(
            "exchange_rates",
            model.id,
            format!("non-positive rate {}", model.rate),
        ));
    }
    Ok(ExchangeRate {
        from_currency: model.from_currency.trim().to_ascii_uppercase(),
        to_currency: model.to_currency.trim().to_ascii_uppercase(),
        rate: model.rate,
        date: model.date,
    })
}

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Most recent snapshot date, if any rates are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_date(&self) -> Result<Option<NaiveDate>, RepositoryError> {
        let latest = exchange_rates::Entity::find()
            .order_by_desc(exchange_rates::Column::Date)
            .one(&self.db)
            .await?;
        Ok(latest.map(|m| m.date))
    }

    /// Loads every rate of the most recent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_snapshot(&self) -> Result<ExchangeRateSnapshot, RepositoryError> {
        let Some(date) = self.latest_date().await? else {
            return Ok(ExchangeRateSnapshot::default());
        };

        let models = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::Date.eq(date))
            .order_by_asc(exchange_rates::Column::FromCurrency)
            .order_by_asc(exchange_rates::Column::ToCurrency)
            .all(&self.db)
            .await?;

        Ok(ExchangeRateSnapshot::latest(decode_all(models, decode_rate)))
    }

    /// Writes fetched rates, replacing rows for the same pair and date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn upsert_rates(&self, rates: &[FetchedRate]) -> Result<usize, RepositoryError> {
        if rates.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().fixed_offset();
        let models = rates.iter().map(|r| exchange_rates::ActiveModel {
            id: Set(Uuid::now_v7()),
            from_currency: Set(r.from_currency.clone()),
            to_currency: Set(r.to_currency.clone()),
            rate: Set(r.rate),
            date: Set(r.date),
            created_at: Set(now),
            updated_at: Set(now),
        });

        exchange_rates::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    exchange_rates::Column::FromCurrency,
                    exchange_rates::Column::ToCurrency,
                    exchange_rates::Column::Date,
                ])
                .update_columns([exchange_rates::Column::Rate, exchange_rates::Column::UpdatedAt])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rates.len())
    }

    /// Appends an update log row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record_update(&self, log: RateUpdateLog) -> Result<(), RepositoryError> {
        let entry = exchange_rate_update_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            update_type: Set(log.update_type),
            status: Set(log.status.as_str().to_string()),
            rates_updated: Set(i32::try_from(log.rates_updated).unwrap_or(i32::MAX)),
            error_message: Set(log.error_message),
            started_at: Set(log.started_at.fixed_offset()),
            completed_at: Set(Some(Utc::now().fixed_offset())),
        };
        entry.insert(&self.db).await?;
        Ok(())
    }
}
