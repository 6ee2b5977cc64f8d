//! Scenario and property tests for the aggregation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::engine::AggregationEngine;
use super::types::{AggregationOptions, AggregationResult, OTHER_CATEGORY};
use crate::billing::BillingCycle;
use crate::subscription::SubscriptionStatus;
use crate::test_support::{category, code, date, rates, subscription};

fn options_cny() -> AggregationOptions {
    AggregationOptions::new(code("CNY"), date(2026, 3, 10))
}

#[test]
fn test_mixed_currency_totals() {
    let subs = vec![
        subscription("Video", dec!(100), "CNY", BillingCycle::Monthly),
        subscription("Cloud", dec!(120), "USD", BillingCycle::Yearly),
    ];
    let rates = rates(&[("USD", "CNY", dec!(7.0))]);

    let result = AggregationEngine::aggregate(&subs, &[], &rates, &options_cny());

    assert_eq!(result.monthly_spending, dec!(170));
    assert_eq!(result.yearly_spending, dec!(2040));
    assert_eq!(result.active_subscriptions, 2);
    assert_eq!(result.currency, "CNY");
}

#[test]
fn test_oversized_row_does_not_abort_aggregation() {
    let subs = vec![
        subscription("Video", dec!(10), "CNY", BillingCycle::Monthly),
        subscription("Broken", Decimal::MAX / dec!(100), "CNY", BillingCycle::Daily),
    ];

    let result = AggregationEngine::aggregate(&subs, &[], &rates(&[]), &options_cny());

    assert_eq!(result.active_subscriptions, 2);
    assert_eq!(result.yearly_spending, dec!(120));
    assert!(result.monthly_spending > dec!(10));
    assert_eq!(result.category_breakdown.len(), 1);
    assert_eq!(result.category_breakdown[0].amount, dec!(120));
}

#[test]
fn test_overflowing_total_skips_row() {
    let subs = vec![
        subscription("A", Decimal::MAX, "CNY", BillingCycle::Monthly),
        subscription("B", Decimal::MAX, "CNY", BillingCycle::Monthly),
    ];

    let result = AggregationEngine::aggregate(&subs, &[], &rates(&[]), &options_cny());

    assert_eq!(result.monthly_spending, Decimal::MAX);
    assert_eq!(result.yearly_spending, Decimal::ZERO);
}

#[test]
fn test_cancelled_subscriptions_are_excluded() {
    let mut cancelled = subscription("Old", dec!(50), "CNY", BillingCycle::Monthly);
    cancelled.status = SubscriptionStatus::Cancelled;
    let subs = vec![
        subscription("Music", dec!(15), "CNY", BillingCycle::Monthly),
        cancelled,
    ];

    let result = AggregationEngine::aggregate(&subs, &[], &rates(&[]), &options_cny());

    assert_eq!(result.active_subscriptions, 1);
    assert_eq!(result.monthly_spending, dec!(15));
    assert_eq!(result.yearly_spending, dec!(180));
}

#[test]
fn test_upcoming_window() {
    let today = date(2026, 3, 10);
    let mut soon = subscription("Soon", dec!(10), "CNY", BillingCycle::Monthly);
    soon.next_billing_date = Some(date(2026, 3, 13));
    let mut later = subscription("Later", dec!(10), "CNY", BillingCycle::Monthly);
    later.next_billing_date = Some(date(2026, 3, 20));
    let mut today_sub = subscription("Today", dec!(10), "CNY", BillingCycle::Monthly);
    today_sub.next_billing_date = Some(today);
    let mut past = subscription("Past", dec!(10), "CNY", BillingCycle::Monthly);
    past.next_billing_date = Some(date(2026, 3, 9));

    let result = AggregationEngine::aggregate(
        &[soon, later, today_sub, past],
        &[],
        &rates(&[]),
        &options_cny(),
    );

    let names: Vec<&str> = result.upcoming_renewals.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Today", "Soon"]);
    assert_eq!(result.upcoming_renewals[1].days_until, 3);
}

#[test]
fn test_upcoming_amount_is_converted_per_charge() {
    let mut sub = subscription("Cloud", dec!(120), "USD", BillingCycle::Yearly);
    sub.next_billing_date = Some(date(2026, 3, 12));

    let result = AggregationEngine::aggregate(
        &[sub],
        &[],
        &rates(&[("USD", "CNY", dec!(7.0))]),
        &options_cny(),
    );

    let renewal = &result.upcoming_renewals[0];
    assert_eq!(renewal.amount, dec!(840));
    assert_eq!(renewal.original_amount, dec!(120));
    assert_eq!(renewal.original_currency, "USD");
}

#[test]
fn test_recently_paid_window_descending() {
    let mut a = subscription("A", dec!(10), "CNY", BillingCycle::Monthly);
    a.last_billing_date = Some(date(2026, 3, 4));
    let mut b = subscription("B", dec!(10), "CNY", BillingCycle::Monthly);
    b.last_billing_date = Some(date(2026, 3, 9));
    let mut c = subscription("C", dec!(10), "CNY", BillingCycle::Monthly);
    c.last_billing_date = Some(date(2026, 3, 1));

    let result = AggregationEngine::aggregate(&[a, b, c], &[], &rates(&[]), &options_cny());

    let names: Vec<&str> = result.recently_paid.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn test_missing_rate_falls_back_to_original_amount() {
    let subs = vec![subscription("Anime", dec!(1500), "JPY", BillingCycle::Monthly)];

    let result = AggregationEngine::aggregate(
        &subs,
        &[],
        &rates(&[("USD", "CNY", dec!(7.0))]),
        &options_cny(),
    );

    assert_eq!(result.monthly_spending, dec!(1500));
    assert_eq!(result.active_subscriptions, 1);
}

#[test]
fn test_category_breakdown_groups_and_sorts() {
    let video = category("video", "视频");
    let music = category("music", "音乐");

    let mut netflix = subscription("Netflix", dec!(50), "CNY", BillingCycle::Monthly);
    netflix.category_id = Some(video.id);
    let mut bilibili = subscription("Bilibili", dec!(25), "CNY", BillingCycle::Monthly);
    bilibili.category_id = Some(video.id);
    let mut spotify = subscription("Spotify", dec!(300), "CNY", BillingCycle::Yearly);
    spotify.category_id = Some(music.id);
    let loose = subscription("Loose", dec!(100), "CNY", BillingCycle::Yearly);

    let result = AggregationEngine::aggregate(
        &[netflix, bilibili, spotify, loose],
        &[video, music],
        &rates(&[]),
        &options_cny(),
    );

    let breakdown = &result.category_breakdown;
    assert_eq!(breakdown.len(), 3);
    assert_eq!(breakdown[0].category, "video");
    assert_eq!(breakdown[0].amount, dec!(900));
    assert_eq!(breakdown[0].subscription_count, 2);
    assert_eq!(breakdown[1].category, "music");
    assert_eq!(breakdown[2].category, OTHER_CATEGORY);
    assert_eq!(breakdown[2].label, "其他");
    assert_eq!(breakdown[0].percentage, dec!(69.23));
}

#[test]
fn test_sections_can_be_skipped() {
    let mut sub = subscription("Soon", dec!(10), "CNY", BillingCycle::Monthly);
    sub.next_billing_date = Some(date(2026, 3, 11));
    sub.last_billing_date = Some(date(2026, 3, 9));

    let mut options = options_cny();
    options.include_upcoming_renewals = false;
    options.include_recently_paid = false;
    options.include_category_breakdown = false;

    let result = AggregationEngine::aggregate(&[sub], &[], &rates(&[]), &options);

    assert!(result.upcoming_renewals.is_empty());
    assert!(result.recently_paid.is_empty());
    assert!(result.category_breakdown.is_empty());
    assert_eq!(result.monthly_spending, dec!(10));
}

#[test]
fn test_empty_result_and_camel_case() {
    let result = AggregationResult::empty("USD");
    assert_eq!(result.monthly_spending, Decimal::ZERO);
    assert_eq!(result.active_subscriptions, 0);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("monthlySpending").is_some());
    assert!(json.get("activeSubscriptions").is_some());
    assert!(json.get("upcomingRenewals").is_some());
    assert_eq!(json["currency"], "USD");
}

fn cycle() -> impl Strategy<Value = BillingCycle> {
    prop::sample::select(vec![
        BillingCycle::Monthly,
        BillingCycle::Quarterly,
        BillingCycle::Yearly,
        BillingCycle::SemiAnnually,
        BillingCycle::Weekly,
        BillingCycle::Daily,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Category percentages sum to 100 within rounding error.
    #[test]
    fn prop_percentages_sum_to_hundred(
        rows in prop::collection::vec((1i64..1_000_000i64, cycle(), 0usize..4), 1..20),
    ) {
        let categories = vec![
            category("video", "Video"),
            category("music", "Music"),
            category("cloud", "Cloud"),
        ];
        let subs: Vec<_> = rows
            .into_iter()
            .map(|(cents, cycle, cat)| {
                let mut sub = subscription("s", Decimal::new(cents, 2), "CNY", cycle);
                sub.category_id = categories.get(cat).map(|c| c.id);
                sub
            })
            .collect();

        let result = AggregationEngine::aggregate(&subs, &categories, &rates(&[]), &options_cny());

        let sum: Decimal = result.category_breakdown.iter().map(|c| c.percentage).sum();
        let groups = Decimal::from(result.category_breakdown.len());
        prop_assert!((sum - Decimal::ONE_HUNDRED).abs() <= dec!(0.01) * groups);
    }

    /// No active subscriptions means every total is zero.
    #[test]
    fn prop_all_cancelled_is_zero(count in 0usize..10) {
        let subs: Vec<_> = (0..count)
            .map(|_| {
                let mut sub = subscription("c", dec!(10), "CNY", BillingCycle::Monthly);
                sub.status = SubscriptionStatus::Cancelled;
                sub
            })
            .collect();

        let result = AggregationEngine::aggregate(&subs, &[], &rates(&[]), &options_cny());

        prop_assert_eq!(result.monthly_spending, Decimal::ZERO);
        prop_assert_eq!(result.yearly_spending, Decimal::ZERO);
        prop_assert!(result.category_breakdown.is_empty());
    }
}
