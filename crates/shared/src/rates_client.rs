//! HTTP client for the external exchange-rate provider.
//!
//! The provider answers `GET {api_url}/latest?base={BASE}` with
//! `{"base": "CNY", "date": "2026-01-02", "rates": {"USD": 0.1389, ...}}`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RatesConfig;
use crate::retry::{RetryPolicy, retry_with_backoff_if};
use crate::types::CurrencyCode;

/// Errors from the exchange-rate provider.
#[derive(Debug, Error)]
pub enum RateClientError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    /// Transport-level failure (connect, timeout, TLS).
    #[error("Request failed: {0}")]
    Request(String),
    /// The provider answered with a non-success status.
    #[error("Provider returned HTTP {0}")]
    Status(u16),
    /// The body could not be decoded.
    #[error("Invalid provider response: {0}")]
    Decode(String),
    /// The provider answered for a different base currency.
    #[error("Provider returned base {actual}, expected {expected}")]
    BaseMismatch {
        /// Requested base.
        expected: String,
        /// Base in the response.
        actual: String,
    },
}

impl RateClientError {
    /// Whether the failure is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::Client(_) | Self::Decode(_) | Self::BaseMismatch { .. } => false,
        }
    }
}

/// One rate as fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRate {
    /// Source currency code (the configured base).
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// `1 from_currency = rate to_currency`.
    pub rate: Decimal,
    /// Rate date reported by the provider.
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: String,
    date: NaiveDate,
    rates: HashMap<String, Decimal>,
}

/// Exchange-rate provider client with retry-with-backoff.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    base_currency: String,
    retry: RetryPolicy,
}

impl ExchangeRateClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RateClientError::Client` if the HTTP client cannot be built.
    pub fn new(config: &RatesConfig) -> Result<Self, RateClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RateClientError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            base_currency: config.base_currency.to_ascii_uppercase(),
            retry: RetryPolicy::from_millis(config.max_attempts, config.base_delay_ms),
        })
    }

    /// Returns the base currency rates are fetched against.
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Fetches the latest rates for the configured base currency.
    ///
    /// # Errors
    ///
    /// Returns the last error once all attempts are used up, or immediately
    /// for non-transient failures.
    pub async fn fetch_latest(&self) -> Result<Vec<FetchedRate>, RateClientError> {
        let body = retry_with_backoff_if(
            &self.retry,
            "fetch_exchange_rates",
            RateClientError::is_transient,
            |_| self.fetch_once(),
        )
        .await?;

        let rates = parse_latest(&body, &self.base_currency)?;
        info!(
            base = %self.base_currency,
            count = rates.len(),
            "Fetched exchange rates"
        );
        Ok(rates)
    }

    async fn fetch_once(&self) -> Result<String, RateClientError> {
        let url = format!("{}/latest", self.api_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("base", self.base_currency.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RateClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateClientError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RateClientError::Request(e.to_string()))
    }
}

/// Decodes a provider body into rate rows.
///
/// Rows with a non-positive rate, an invalid code, or the base itself as
/// target are dropped with a warning.
///
/// # Errors
///
/// Returns `Decode` for malformed JSON and `BaseMismatch` when the provider
/// answered for another base.
pub fn parse_latest(body: &str, expected_base: &str) -> Result<Vec<FetchedRate>, RateClientError> {
    let response: LatestRatesResponse =
        serde_json::from_str(body).map_err(|e| RateClientError::Decode(e.to_string()))?;

    let base = response.base.to_ascii_uppercase();
    if base != expected_base {
        return Err(RateClientError::BaseMismatch {
            expected: expected_base.to_string(),
            actual: base,
        });
    }

    let mut rates: Vec<FetchedRate> = response
        .rates
        .into_iter()
        .filter_map(|(code, rate)| {
            let Ok(code) = CurrencyCode::parse(&code) else {
                warn!(code = %code, "Skipping rate with invalid currency code");
                return None;
            };
            if code.as_str() == base {
                return None;
            }
            if rate <= Decimal::ZERO {
                warn!(code = %code, rate = %rate, "Skipping non-positive rate");
                return None;
            }
            Some(FetchedRate {
                from_currency: base.clone(),
                to_currency: code.into(),
                rate,
                date: response.date,
            })
        })
        .collect();

    rates.sort_by(|a, b| a.to_currency.cmp(&b.to_currency));
    Ok(rates)
}
