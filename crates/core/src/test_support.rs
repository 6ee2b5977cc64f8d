//! Fixtures shared by unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use subtrack_shared::types::{CategoryId, CurrencyCode, SubscriptionId, UserId};

use crate::billing::BillingCycle;
use crate::currency::{ExchangeRate, RateMap};
use crate::subscription::{Category, Subscription, SubscriptionStatus};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn code(value: &str) -> CurrencyCode {
    CurrencyCode::parse(value).unwrap()
}

pub fn subscription(name: &str, amount: Decimal, currency: &str, cycle: BillingCycle) -> Subscription {
    Subscription {
        id: SubscriptionId::new(),
        user_id: UserId::new(),
        name: name.to_string(),
        amount,
        currency: code(currency),
        billing_cycle: cycle,
        status: SubscriptionStatus::Active,
        next_billing_date: None,
        last_billing_date: None,
        start_date: None,
        category_id: None,
        payment_method_id: None,
    }
}

pub fn category(value: &str, label: &str) -> Category {
    Category {
        id: CategoryId::new(),
        value: value.to_string(),
        label: label.to_string(),
        user_id: None,
    }
}

pub fn rates(pairs: &[(&str, &str, Decimal)]) -> RateMap {
    let rows: Vec<ExchangeRate> = pairs
        .iter()
        .map(|(from, to, rate)| ExchangeRate::new(from, to, *rate, date(2026, 1, 1)))
        .collect();
    RateMap::from_rates(&rows, "CNY")
}
