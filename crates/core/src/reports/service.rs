//! Report generation engine.

use chrono::{Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::error::ReportError;
use super::types::{
    ExpenseReport, ExpenseSummary, MAX_REPORT_MONTHS, MonthlyExpense, QuarterlyExpense,
    ReportRequest, YearlyExpense,
};
use crate::aggregation::AggregationEngine;
use crate::billing::{to_monthly, to_quarterly, to_yearly};
use crate::currency::{RateMap, add_money, convert, round_money, sum_money};
use crate::subscription::{Category, Subscription};

/// Computes historical expense series.
pub struct ReportEngine;

/// Unrounded total and count for one period.
struct Bucket {
    amount: Decimal,
    count: usize,
}

impl ReportEngine {
    /// Generates an expense report over `[request.start, request.end]`.
    ///
    /// Only active subscriptions are counted.
    pub fn generate(
        subscriptions: &[Subscription],
        categories: &[Category],
        rates: &RateMap,
        request: &ReportRequest,
    ) -> Result<ExpenseReport, ReportError> {
        let month_count = Self::validate_range(request.start, request.end)?;
        let target = request.target_currency.as_str();
        let active: Vec<&Subscription> = subscriptions.iter().filter(|s| s.is_active()).collect();

        let month_starts = Self::month_starts(request.start, month_count);
        let monthly_buckets: Vec<(NaiveDate, Bucket)> = month_starts
            .iter()
            .map(|&first| {
                let bucket = Self::bucket(&active, first, |s| {
                    convert(to_monthly(s.amount, &s.billing_cycle), s.currency.as_str(), target, rates)
                });
                (first, bucket)
            })
            .collect();

        let total = sum_money(monthly_buckets.iter().map(|(_, b)| b.amount));
        let summary = ExpenseSummary {
            total: round_money(total),
            average_monthly: round_money(total / Decimal::from(month_count)),
            month_count,
        };

        let monthly = if request.include_monthly {
            monthly_buckets
                .into_iter()
                .map(|(first, bucket)| MonthlyExpense {
                    period: first.format("%Y-%m").to_string(),
                    start_date: first,
                    amount: round_money(bucket.amount),
                    subscription_count: bucket.count,
                })
                .collect()
        } else {
            Vec::new()
        };

        let quarterly = if request.include_quarterly {
            Self::quarter_starts(request.start, request.end)
                .into_iter()
                .map(|first| {
                    let bucket = Self::bucket(&active, first, |s| {
                        convert(to_quarterly(s.amount, &s.billing_cycle), s.currency.as_str(), target, rates)
                    });
                    let quarter = first.month0() / 3 + 1;
                    QuarterlyExpense {
                        period: format!("{}-Q{quarter}", first.year()),
                        year: first.year(),
                        quarter,
                        start_date: first,
                        amount: round_money(bucket.amount),
                        subscription_count: bucket.count,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let yearly = if request.include_yearly {
            Self::yearly_series(&active, rates, target, request.start.year(), request.end.year())
        } else {
            Vec::new()
        };

        let category_year = request.end.year();
        let category_breakdown = if request.include_category_breakdown {
            let year_end = NaiveDate::from_ymd_opt(category_year, 12, 31).unwrap_or(request.end);
            let amounts = active
                .iter()
                .filter(|s| s.started_on_or_before(year_end))
                .map(|s| {
                    let yearly = to_yearly(s.amount, &s.billing_cycle);
                    (*s, convert(yearly, s.currency.as_str(), target, rates))
                });
            AggregationEngine::category_breakdown(amounts, categories)
        } else {
            Vec::new()
        };

        debug!(
            start = %request.start,
            end = %request.end,
            months = month_count,
            currency = target,
            "Generated expense report"
        );

        Ok(ExpenseReport {
            currency: target.to_string(),
            start_date: request.start,
            end_date: request.end,
            monthly,
            quarterly,
            yearly,
            category_year,
            category_breakdown,
            summary,
            payment_history: None,
            generated_at: Utc::now(),
        })
    }

    /// Validates the range and returns the number of calendar months it touches.
    pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<u32, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        let years = u32::try_from(end.year() - start.year()).unwrap_or(u32::MAX);
        let months = years
            .saturating_mul(12)
            .saturating_add(end.month())
            .saturating_sub(start.month())
            .saturating_add(1);
        if months > MAX_REPORT_MONTHS {
            return Err(ReportError::RangeTooLarge {
                months,
                max: MAX_REPORT_MONTHS,
            });
        }
        Ok(months)
    }

    fn bucket(
        active: &[&Subscription],
        period_start: NaiveDate,
        amount: impl Fn(&Subscription) -> Decimal,
    ) -> Bucket {
        active
            .iter()
            .filter(|s| s.started_on_or_before(period_start))
            .fold(
                Bucket {
                    amount: Decimal::ZERO,
                    count: 0,
                },
                |acc, s| Bucket {
                    amount: add_money(acc.amount, amount(s)),
                    count: acc.count + 1,
                },
            )
    }

    fn first_of_month(date: NaiveDate) -> NaiveDate {
        date.with_day(1).unwrap_or(date)
    }

    fn month_starts(start: NaiveDate, count: u32) -> Vec<NaiveDate> {
        let first = Self::first_of_month(start);
        (0..count)
            .filter_map(|i| first.checked_add_months(Months::new(i)))
            .collect()
    }

    fn quarter_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let quarter_month = start.month0() / 3 * 3 + 1;
        let Some(mut current) = NaiveDate::from_ymd_opt(start.year(), quarter_month, 1) else {
            return Vec::new();
        };
        let mut starts = Vec::new();
        while current <= end {
            starts.push(current);
            match current.checked_add_months(Months::new(3)) {
                Some(next) => current = next,
                None => break,
            }
        }
        starts
    }

    fn yearly_series(
        active: &[&Subscription],
        rates: &RateMap,
        target: &str,
        first_year: i32,
        last_year: i32,
    ) -> Vec<YearlyExpense> {
        let mut series: Vec<YearlyExpense> = Vec::new();
        let mut previous: Option<Decimal> = None;

        for year in first_year..=last_year {
            let Some(jan_first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
                continue;
            };
            let bucket = Self::bucket(active, jan_first, |s| {
                convert(to_yearly(s.amount, &s.billing_cycle), s.currency.as_str(), target, rates)
            });
            let change_percent = previous
                .and_then(|prev| Self::change_percent(prev, bucket.amount))
                .unwrap_or(Decimal::ZERO);
            previous = Some(bucket.amount);
            series.push(YearlyExpense {
                year,
                amount: round_money(bucket.amount),
                subscription_count: bucket.count,
                change_percent,
            });
        }

        series
    }

    /// Year-over-year change in percent, from unrounded totals.
    fn change_percent(previous: Decimal, current: Decimal) -> Option<Decimal> {
        if previous.is_zero() {
            return None;
        }
        current
            .checked_sub(previous)?
            .checked_div(previous)?
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(round_money)
    }
}
