//! Currency conversion against a rate map.
//!
//! Conversion never fails: when no path between two currencies exists the
//! amount is returned unconverted and a warning is logged, so one missing
//! rate cannot drop a subscription from a total.
//!
//! Rounding strategy: intermediate values keep full `Decimal` precision;
//! only final outputs go through [`round_money`] (banker's rounding, 2 places).
//!
//! Arithmetic is checked. An overflowing product or sum drops the offending
//! amount with a warning instead of panicking.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use super::exchange::ExchangeRate;

/// Base currency for two-hop conversion when none is configured.
pub const DEFAULT_BASE_CURRENCY: &str = "CNY";

/// How a conversion rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLookupMethod {
    /// Same currency, rate 1.
    Identity,
    /// A `from_to` entry (stored or synthesized inverse).
    Direct,
    /// Two hops through the base currency.
    Triangulated,
}

impl RateLookupMethod {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Direct => "direct",
            Self::Triangulated => "triangulated",
        }
    }
}

/// Lookup table keyed by `"{from}_{to}"`.
#[derive(Debug, Clone, Default)]
pub struct RateMap {
    rates: HashMap<String, Decimal>,
    base_currency: String,
}

fn key(from: &str, to: &str) -> String {
    format!("{from}_{to}")
}

impl RateMap {
    /// Creates an empty map with the given base currency.
    #[must_use]
    pub fn new(base_currency: &str) -> Self {
        Self {
            rates: HashMap::new(),
            base_currency: base_currency.to_string(),
        }
    }

    /// Builds a map from stored rates, synthesizing `rate(B→A) = 1 / rate(A→B)`
    /// where only one direction is stored.
    ///
    /// Stored rows always win over synthesized inverses. Non-positive rates
    /// and self-pairs are skipped.
    #[must_use]
    pub fn from_rates(rates: &[ExchangeRate], base_currency: &str) -> Self {
        let mut map = Self::new(base_currency);

        for rate in rates {
            if rate.from_currency == rate.to_currency {
                continue;
            }
            if rate.rate <= Decimal::ZERO {
                warn!(
                    from = %rate.from_currency,
                    to = %rate.to_currency,
                    rate = %rate.rate,
                    "Skipping non-positive exchange rate"
                );
                continue;
            }
            map.rates
                .insert(key(&rate.from_currency, &rate.to_currency), rate.rate);
        }

        for rate in rates {
            if rate.from_currency == rate.to_currency || rate.rate <= Decimal::ZERO {
                continue;
            }
            if let Some(inverse) = rate.inverse() {
                map.rates
                    .entry(key(&inverse.from_currency, &inverse.to_currency))
                    .or_insert(inverse.rate);
            }
        }

        map
    }

    /// Returns the `from→to` entry, if present.
    #[must_use]
    pub fn get(&self, from: &str, to: &str) -> Option<Decimal> {
        self.rates.get(&key(from, to)).copied()
    }

    /// Base currency used for two-hop conversion.
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Number of entries, including synthesized inverses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Finds the rate for `from→to`: identity, direct entry, then two hops
    /// through the base currency.
    #[must_use]
    pub fn resolve(&self, from: &str, to: &str) -> Option<(Decimal, RateLookupMethod)> {
        if from == to {
            return Some((Decimal::ONE, RateLookupMethod::Identity));
        }

        if let Some(rate) = self.get(from, to) {
            return Some((rate, RateLookupMethod::Direct));
        }

        let base = self.base_currency.as_str();
        if from != base && to != base {
            if let (Some(to_base), Some(from_base)) = (self.get(from, base), self.get(base, to)) {
                if let Some(rate) = to_base.checked_mul(from_base) {
                    return Some((rate, RateLookupMethod::Triangulated));
                }
            }
        }

        None
    }
}

/// Converts `amount` from one currency to another.
///
/// Same-currency conversion returns `amount` untouched. When no path exists
/// the original amount is returned and a warning is logged. A converted
/// amount that overflows is treated as 0.
#[must_use]
pub fn convert(amount: Decimal, from: &str, to: &str, rates: &RateMap) -> Decimal {
    if from == to {
        return amount;
    }

    if let Some((rate, _)) = rates.resolve(from, to) {
        amount.checked_mul(rate).unwrap_or_else(|| {
            warn!(from, to, amount = %amount, rate = %rate, "Converted amount overflows, treated as 0");
            Decimal::ZERO
        })
    } else {
        warn!(
            from,
            to,
            base = rates.base_currency(),
            amount = %amount,
            "No exchange rate path, using unconverted amount"
        );
        amount
    }
}

/// Adds `amount` to a running total. On overflow the amount is skipped and
/// the total returned unchanged.
#[must_use]
pub fn add_money(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        warn!(total = %total, amount = %amount, "Total overflows, amount skipped");
        total
    })
}

/// Sums amounts with [`add_money`].
#[must_use]
pub fn sum_money(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, add_money)
}

/// Rounds a monetary output to 2 decimal places with banker's rounding.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rate(from: &str, to: &str, value: Decimal) -> ExchangeRate {
        ExchangeRate::new(
            from,
            to,
            value,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_same_currency_is_identity() {
        let map = RateMap::new("CNY");
        assert_eq!(convert(dec!(123.456), "USD", "USD", &map), dec!(123.456));
    }

    #[test]
    fn test_direct_conversion() {
        let map = RateMap::from_rates(&[rate("USD", "CNY", dec!(7.0))], "CNY");
        assert_eq!(convert(dec!(10), "USD", "CNY", &map), dec!(70.0));
    }

    #[test]
    fn test_inverse_is_synthesized() {
        let map = RateMap::from_rates(&[rate("USD", "CNY", dec!(8))], "CNY");
        assert_eq!(map.get("CNY", "USD"), Some(dec!(0.125)));
        assert_eq!(convert(dec!(80), "CNY", "USD", &map), dec!(10.000));
    }

    #[test]
    fn test_stored_direction_wins_over_synthesized() {
        let map = RateMap::from_rates(
            &[rate("USD", "CNY", dec!(8)), rate("CNY", "USD", dec!(0.13))],
            "CNY",
        );
        assert_eq!(map.get("CNY", "USD"), Some(dec!(0.13)));
        assert_eq!(map.get("USD", "CNY"), Some(dec!(8)));
    }

    #[test]
    fn test_zero_and_self_rates_are_skipped() {
        let map = RateMap::from_rates(
            &[rate("USD", "CNY", Decimal::ZERO), rate("CNY", "CNY", dec!(1))],
            "CNY",
        );
        assert!(map.is_empty());
    }

    #[test]
    fn test_two_hop_through_base() {
        let map = RateMap::from_rates(
            &[rate("USD", "CNY", dec!(7)), rate("CNY", "EUR", dec!(0.125))],
            "CNY",
        );

        let (value, method) = map.resolve("USD", "EUR").unwrap();
        assert_eq!(method, RateLookupMethod::Triangulated);
        assert_eq!(value, dec!(0.875));
        assert_eq!(convert(dec!(100), "USD", "EUR", &map), dec!(87.500));
    }

    #[test]
    fn test_missing_path_returns_original_amount() {
        let map = RateMap::from_rates(&[rate("USD", "CNY", dec!(7))], "CNY");
        assert_eq!(map.resolve("JPY", "CNY"), None);
        assert_eq!(convert(dec!(1500), "JPY", "CNY", &map), dec!(1500));
    }

    #[test]
    fn test_overflowing_conversion_counts_as_zero() {
        let map = RateMap::from_rates(&[rate("USD", "CNY", dec!(7))], "CNY");
        assert_eq!(convert(Decimal::MAX, "USD", "CNY", &map), Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_triangulation_is_unresolved() {
        let map = RateMap::from_rates(
            &[rate("USD", "CNY", Decimal::MAX), rate("CNY", "EUR", dec!(10))],
            "CNY",
        );
        assert_eq!(map.resolve("USD", "EUR"), None);
    }

    #[test]
    fn test_sum_money_skips_overflow() {
        assert_eq!(sum_money([dec!(1), Decimal::MAX, dec!(2)]), dec!(3));
        assert_eq!(sum_money([dec!(1.5), dec!(2.5)]), dec!(4.0));
        assert_eq!(add_money(Decimal::MAX, dec!(1)), Decimal::MAX);
    }

    #[test]
    fn test_round_money_bankers() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_money(dec!(169.999999)), dec!(170.00));
    }
}
