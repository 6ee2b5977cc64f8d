//! Tests for the reporting engine.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ReportError;
use super::service::ReportEngine;
use super::types::ReportRequest;
use crate::billing::BillingCycle;
use crate::test_support::{category, code, date, rates, subscription};

fn request(start: chrono::NaiveDate, end: chrono::NaiveDate) -> ReportRequest {
    ReportRequest::new(code("CNY"), start, end)
}

#[test]
fn test_monthly_series_respects_start_date() {
    let always = subscription("Always", dec!(10), "CNY", BillingCycle::Monthly);
    let mut later = subscription("Later", dec!(20), "CNY", BillingCycle::Monthly);
    later.start_date = Some(date(2025, 3, 1));
    let mut mid_month = subscription("Mid", dec!(5), "CNY", BillingCycle::Monthly);
    mid_month.start_date = Some(date(2025, 2, 15));

    let report = ReportEngine::generate(
        &[always, later, mid_month],
        &[],
        &rates(&[]),
        &request(date(2025, 1, 10), date(2025, 4, 5)),
    )
    .unwrap();

    let amounts: Vec<Decimal> = report.monthly.iter().map(|m| m.amount).collect();
    assert_eq!(amounts, vec![dec!(10), dec!(10), dec!(35), dec!(35)]);
    assert_eq!(report.monthly[0].period, "2025-01");
    assert_eq!(report.monthly[2].subscription_count, 3);
    assert_eq!(report.summary.month_count, 4);
    assert_eq!(report.summary.total, dec!(90));
    assert_eq!(report.summary.average_monthly, dec!(22.50));
}

#[test]
fn test_quarterly_series() {
    let yearly = subscription("Cloud", dec!(120), "USD", BillingCycle::Yearly);
    let report = ReportEngine::generate(
        &[yearly],
        &[],
        &rates(&[("USD", "CNY", dec!(7))]),
        &request(date(2025, 2, 1), date(2025, 7, 31)),
    )
    .unwrap();

    let periods: Vec<&str> = report.quarterly.iter().map(|q| q.period.as_str()).collect();
    assert_eq!(periods, vec!["2025-Q1", "2025-Q2", "2025-Q3"]);
    assert_eq!(report.quarterly[0].amount, dec!(210));
    assert_eq!(report.quarterly[2].quarter, 3);
}

#[test]
fn test_yearly_change_percent() {
    let old = subscription("Old", dec!(100), "CNY", BillingCycle::Monthly);
    let mut new = subscription("New", dec!(50), "CNY", BillingCycle::Monthly);
    new.start_date = Some(date(2024, 1, 1));

    let report = ReportEngine::generate(
        &[old, new],
        &[],
        &rates(&[]),
        &request(date(2023, 1, 1), date(2024, 12, 31)),
    )
    .unwrap();

    assert_eq!(report.yearly.len(), 2);
    assert_eq!(report.yearly[0].amount, dec!(1200));
    assert_eq!(report.yearly[0].change_percent, Decimal::ZERO);
    assert_eq!(report.yearly[1].amount, dec!(1800));
    assert_eq!(report.yearly[1].change_percent, dec!(50));
}

#[test]
fn test_change_percent_uses_unrounded_totals() {
    let first = subscription("First", dec!(1.005), "CNY", BillingCycle::Yearly);
    let mut second = subscription("Second", dec!(1.005), "CNY", BillingCycle::Yearly);
    second.start_date = Some(date(2024, 1, 1));

    let report = ReportEngine::generate(
        &[first, second],
        &[],
        &rates(&[]),
        &request(date(2023, 1, 1), date(2024, 12, 31)),
    )
    .unwrap();

    assert_eq!(report.yearly[0].amount, dec!(1.00));
    assert_eq!(report.yearly[1].amount, dec!(2.01));
    assert_eq!(report.yearly[1].change_percent, dec!(100));
}

#[test]
fn test_oversized_row_does_not_abort_report() {
    let normal = subscription("Normal", dec!(10), "CNY", BillingCycle::Monthly);
    let huge = subscription("Huge", Decimal::MAX / dec!(100), "CNY", BillingCycle::Daily);

    let report = ReportEngine::generate(
        &[normal, huge],
        &[],
        &rates(&[]),
        &request(date(2025, 1, 1), date(2025, 12, 31)),
    )
    .unwrap();

    assert_eq!(report.yearly[0].amount, dec!(120));
    assert_eq!(report.yearly[0].subscription_count, 2);
}

#[test]
fn test_year_without_subscriptions_is_zero() {
    let mut sub = subscription("Later", dec!(10), "CNY", BillingCycle::Monthly);
    sub.start_date = Some(date(2024, 6, 1));

    let report = ReportEngine::generate(
        &[sub],
        &[],
        &rates(&[]),
        &request(date(2023, 1, 1), date(2025, 12, 31)),
    )
    .unwrap();

    let amounts: Vec<Decimal> = report.yearly.iter().map(|y| y.amount).collect();
    assert_eq!(amounts, vec![Decimal::ZERO, Decimal::ZERO, dec!(120)]);
    assert_eq!(report.yearly[2].change_percent, Decimal::ZERO);
}

#[test]
fn test_category_breakdown_uses_end_year() {
    let video = category("video", "Video");
    let mut current = subscription("Current", dec!(10), "CNY", BillingCycle::Monthly);
    current.category_id = Some(video.id);
    let mut future = subscription("Future", dec!(10), "CNY", BillingCycle::Monthly);
    future.start_date = Some(date(2026, 1, 1));

    let report = ReportEngine::generate(
        &[current, future],
        &[video],
        &rates(&[]),
        &request(date(2025, 1, 1), date(2025, 6, 30)),
    )
    .unwrap();

    assert_eq!(report.category_year, 2025);
    assert_eq!(report.category_breakdown.len(), 1);
    assert_eq!(report.category_breakdown[0].category, "video");
    assert_eq!(report.category_breakdown[0].percentage, dec!(100));
}

#[test]
fn test_sections_can_be_skipped() {
    let sub = subscription("A", dec!(10), "CNY", BillingCycle::Monthly);
    let mut req = request(date(2025, 1, 1), date(2025, 3, 31));
    req.include_monthly = false;
    req.include_quarterly = false;
    req.include_yearly = false;
    req.include_category_breakdown = false;

    let report = ReportEngine::generate(&[sub], &[], &rates(&[]), &req).unwrap();

    assert!(report.monthly.is_empty());
    assert!(report.quarterly.is_empty());
    assert!(report.yearly.is_empty());
    assert!(report.category_breakdown.is_empty());
    assert_eq!(report.summary.total, dec!(30));
}

#[test]
fn test_invalid_range() {
    let err = ReportEngine::validate_range(date(2025, 2, 1), date(2025, 1, 1)).unwrap_err();
    assert!(matches!(err, ReportError::InvalidDateRange { .. }));
}

#[test]
fn test_range_limit() {
    assert_eq!(
        ReportEngine::validate_range(date(2015, 1, 1), date(2024, 12, 31)),
        Ok(120)
    );
    assert_eq!(
        ReportEngine::validate_range(date(2015, 1, 1), date(2025, 1, 1)),
        Err(ReportError::RangeTooLarge {
            months: 121,
            max: 120
        })
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A subscription contributes nothing to months before its start.
    #[test]
    fn prop_not_started_contributes_zero(start_month in 1u32..=12, cents in 1i64..1_000_000) {
        let mut sub = subscription("S", Decimal::new(cents, 2), "CNY", BillingCycle::Monthly);
        sub.start_date = Some(date(2025, start_month, 1));

        let report = ReportEngine::generate(
            &[sub],
            &[],
            &rates(&[]),
            &request(date(2025, 1, 1), date(2025, 12, 31)),
        )
        .unwrap();

        for month in &report.monthly {
            if month.start_date < date(2025, start_month, 1) {
                prop_assert_eq!(month.amount, Decimal::ZERO);
                prop_assert_eq!(month.subscription_count, 0);
            } else {
                prop_assert_eq!(month.amount, Decimal::new(cents, 2));
            }
        }
    }
}
