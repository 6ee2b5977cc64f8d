//! Exchange rate types and snapshot selection.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::conversion::RateMap;

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Date of the snapshot this rate belongs to.
    pub date: NaiveDate,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub fn new(from_currency: &str, to_currency: &str, rate: Decimal, date: NaiveDate) -> Self {
        Self {
            from_currency: from_currency.to_string(),
            to_currency: to_currency.to_string(),
            rate,
            date,
        }
    }

    /// Returns the inverse rate, or `None` when the rate is zero.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate).filter(|r| !r.is_zero())?;
        Some(Self {
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate,
            date: self.date,
        })
    }
}

/// The set of rates sharing one snapshot date.
///
/// Every aggregation runs against exactly one snapshot, so rates from
/// different days are never mixed within a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    date: Option<NaiveDate>,
    rates: Vec<ExchangeRate>,
}

impl ExchangeRateSnapshot {
    /// Keeps only the rows carrying the most recent date.
    #[must_use]
    pub fn latest(rows: Vec<ExchangeRate>) -> Self {
        let Some(date) = rows.iter().map(|r| r.date).max() else {
            return Self::default();
        };
        let rates = rows.into_iter().filter(|r| r.date == date).collect();
        Self {
            date: Some(date),
            rates,
        }
    }

    /// Snapshot date, `None` when no rates are stored at all.
    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Rates in this snapshot.
    #[must_use]
    pub fn rates(&self) -> &[ExchangeRate] {
        &self.rates
    }

    /// Returns true if the snapshot holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Builds the lookup map (stored rates plus synthesized inverses).
    #[must_use]
    pub fn rate_map(&self, base_currency: &str) -> RateMap {
        RateMap::from_rates(&self.rates, base_currency)
    }
}
