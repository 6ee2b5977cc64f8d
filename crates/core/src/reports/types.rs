//! Report data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtrack_shared::types::CurrencyCode;

use crate::aggregation::CategoryBreakdown;
use crate::payments::PaymentHistorySummary;

/// Longest accepted report range, in calendar months.
pub const MAX_REPORT_MONTHS: u32 = 120;

/// What to compute for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Display currency.
    pub target_currency: CurrencyCode,
    /// First day of the range (inclusive).
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
    /// Compute the monthly series.
    pub include_monthly: bool,
    /// Compute the quarterly series.
    pub include_quarterly: bool,
    /// Compute the yearly series.
    pub include_yearly: bool,
    /// Compute the category breakdown for the end year.
    pub include_category_breakdown: bool,
}

impl ReportRequest {
    /// Request with every section enabled.
    #[must_use]
    pub fn new(target_currency: CurrencyCode, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            target_currency,
            start,
            end,
            include_monthly: true,
            include_quarterly: true,
            include_yearly: true,
            include_category_breakdown: true,
        }
    }
}

/// Spend for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpense {
    /// `YYYY-MM`.
    pub period: String,
    /// First day of the month.
    pub start_date: NaiveDate,
    /// Converted spend.
    pub amount: Decimal,
    /// Subscriptions counted.
    pub subscription_count: usize,
}

/// Spend for one calendar quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyExpense {
    /// `YYYY-Qn`.
    pub period: String,
    /// Year.
    pub year: i32,
    /// Quarter, 1..=4.
    pub quarter: u32,
    /// First day of the quarter.
    pub start_date: NaiveDate,
    /// Converted spend.
    pub amount: Decimal,
    /// Subscriptions counted.
    pub subscription_count: usize,
}

/// Spend for one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyExpense {
    /// Year.
    pub year: i32,
    /// Converted spend.
    pub amount: Decimal,
    /// Subscriptions counted.
    pub subscription_count: usize,
    /// Change versus the previous year in the series, in percent.
    pub change_percent: Decimal,
}

/// Totals over the monthly series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    /// Sum of every month.
    pub total: Decimal,
    /// Mean spend per month.
    pub average_monthly: Decimal,
    /// Months in range.
    pub month_count: u32,
}

/// Historical expense report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    /// Display currency.
    pub currency: String,
    /// Range start.
    pub start_date: NaiveDate,
    /// Range end.
    pub end_date: NaiveDate,
    /// Monthly series.
    pub monthly: Vec<MonthlyExpense>,
    /// Quarterly series.
    pub quarterly: Vec<QuarterlyExpense>,
    /// Yearly series.
    pub yearly: Vec<YearlyExpense>,
    /// Year the category breakdown covers.
    pub category_year: i32,
    /// Yearly spend per category.
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Summary of the monthly series.
    pub summary: ExpenseSummary,
    /// Actual payments recorded in the range, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_history: Option<PaymentHistorySummary>,
    /// When the report was computed.
    pub generated_at: DateTime<Utc>,
}
