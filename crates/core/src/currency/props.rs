//! Property-based tests for currency conversion.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::conversion::{RateMap, convert, round_money};
use super::exchange::ExchangeRate;

/// Strategy to generate amounts (0.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn currency() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["CNY", "USD", "EUR", "JPY", "GBP"])
}

fn snapshot(from: &str, to: &str, rate: Decimal) -> RateMap {
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
    RateMap::from_rates(&[ExchangeRate::new(from, to, rate, date)], "CNY")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converting to the same currency never changes the amount.
    #[test]
    fn prop_same_currency_is_identity(
        amount in amount(),
        code in currency(),
        rate in positive_rate(),
    ) {
        let rates = snapshot("USD", "CNY", rate);
        prop_assert_eq!(convert(amount, code, code, &rates), amount);
    }

    /// A→B→A returns the original amount after rounding.
    #[test]
    fn prop_round_trip_through_inverse(
        amount in amount(),
        rate in positive_rate(),
    ) {
        let rates = snapshot("USD", "CNY", rate);
        let there = convert(amount, "USD", "CNY", &rates);
        let back = convert(there, "CNY", "USD", &rates);
        prop_assert_eq!(round_money(back), amount);
    }

    /// Missing paths return the amount unconverted.
    #[test]
    fn prop_missing_path_falls_back(
        amount in amount(),
        rate in positive_rate(),
    ) {
        let rates = snapshot("USD", "CNY", rate);
        prop_assert_eq!(convert(amount, "JPY", "EUR", &rates), amount);
    }

    /// Conversion of a non-negative amount is non-negative.
    #[test]
    fn prop_non_negative_output(
        amount in amount(),
        rate in positive_rate(),
    ) {
        let rates = snapshot("USD", "CNY", rate);
        prop_assert!(convert(amount, "USD", "CNY", &rates) >= Decimal::ZERO);
        prop_assert!(convert(amount, "CNY", "USD", &rates) >= Decimal::ZERO);
    }
}
