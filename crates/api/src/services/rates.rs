//! Exchange-rate reads and the rate update job.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use subtrack_core::currency::{ExchangeRateSnapshot, round_money};
use subtrack_db::ExchangeRateRepository;
use subtrack_db::repositories::{RateUpdateLog, RateUpdateStatus};
use subtrack_shared::types::CurrencyCode;
use subtrack_shared::{AppError, ExchangeRateClient};
use tracing::{error, info};

/// Result of a single conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Source currency.
    pub from: String,
    /// Target currency.
    pub to: String,
    /// Input amount.
    pub amount: Decimal,
    /// Converted amount, rounded to cents.
    pub converted: Decimal,
    /// Effective rate.
    pub rate: Decimal,
    /// `identity`, `direct` or `triangulated`.
    pub method: &'static str,
    /// Snapshot date, absent for identity conversions on an empty table.
    pub rate_date: Option<NaiveDate>,
}

/// Outcome of a rate update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdateSummary {
    /// Rows written.
    pub rates_updated: usize,
    /// Provider date of the stored snapshot.
    pub rate_date: Option<NaiveDate>,
}

/// Loads the most recent snapshot.
///
/// # Errors
///
/// Returns `AppError::Database` when the query fails.
pub async fn latest(db: &DatabaseConnection) -> Result<ExchangeRateSnapshot, AppError> {
    Ok(ExchangeRateRepository::new(db.clone()).latest_snapshot().await?)
}

/// Converts one amount with the latest snapshot.
///
/// # Errors
///
/// Returns `AppError::Validation` for invalid codes and `AppError::NotFound`
/// when no direct, inverse or base-currency route exists.
pub async fn convert(
    db: &DatabaseConnection,
    base_currency: &str,
    from: &str,
    to: &str,
    amount: Decimal,
) -> Result<Conversion, AppError> {
    let from = CurrencyCode::parse(from).map_err(|e| AppError::Validation(e.to_string()))?;
    let to = CurrencyCode::parse(to).map_err(|e| AppError::Validation(e.to_string()))?;

    let snapshot = latest(db).await?;
    let rates = snapshot.rate_map(base_currency);
    let Some((rate, method)) = rates.resolve(from.as_str(), to.as_str()) else {
        return Err(AppError::NotFound(format!("No exchange rate for {from}/{to}")));
    };
    let converted = amount
        .checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| AppError::Validation("Amount out of range".to_string()))?;

    Ok(Conversion {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        converted,
        rate,
        method: method.as_str(),
        rate_date: snapshot.date(),
    })
}

/// Fetches the latest provider rates, stores them and writes an update log.
///
/// The log row is written for failed runs too.
///
/// # Errors
///
/// Returns `AppError::ExternalService` when the provider fails after all
/// retries, `AppError::Database` when storing fails.
pub async fn run_rate_update(
    db: &DatabaseConnection,
    client: &ExchangeRateClient,
    update_type: &str,
) -> Result<RateUpdateSummary, AppError> {
    let repo = ExchangeRateRepository::new(db.clone());
    let started_at = Utc::now();

    let outcome = match client.fetch_latest().await {
        Ok(rates) => repo
            .upsert_rates(&rates)
            .await
            .map(|count| (count, rates.first().map(|r| r.date)))
            .map_err(AppError::from),
        Err(e) => Err(AppError::ExternalService(e.to_string())),
    };

    let log = match &outcome {
        Ok((count, _)) => RateUpdateLog {
            update_type: update_type.to_string(),
            status: RateUpdateStatus::Success,
            rates_updated: *count,
            error_message: None,
            started_at,
        },
        Err(e) => RateUpdateLog {
            update_type: update_type.to_string(),
            status: RateUpdateStatus::Failed,
            rates_updated: 0,
            error_message: Some(e.to_string()),
            started_at,
        },
    };
    if let Err(e) = repo.record_update(log).await {
        error!(error = %e, "Failed to write rate update log");
    }

    let (rates_updated, rate_date) = outcome?;
    info!(rates_updated, ?rate_date, base = client.base_currency(), "Exchange rates updated");
    Ok(RateUpdateSummary {
        rates_updated,
        rate_date,
    })
}
