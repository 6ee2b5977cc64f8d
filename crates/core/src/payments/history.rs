//! Payment records and their analysis.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtrack_shared::types::{CurrencyCode, PaymentRecordId, SubscriptionId};

use crate::currency::{RateMap, add_money, convert, round_money};

/// Outcome of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Money moved.
    Success,
    /// Charge failed.
    Failed,
    /// Not settled yet.
    Pending,
}

impl PaymentStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" | "succeeded" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "pending" => Ok(Self::Pending),
            other => Err(format!("Unknown payment status: {other}")),
        }
    }
}

/// One historical payment of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Record ID.
    pub id: PaymentRecordId,
    /// Paid subscription.
    pub subscription_id: SubscriptionId,
    /// Day the payment happened.
    pub payment_date: NaiveDate,
    /// Amount charged.
    pub amount_paid: Decimal,
    /// Charge currency.
    pub currency: CurrencyCode,
    /// Covered period start.
    pub billing_period_start: Option<NaiveDate>,
    /// Covered period end.
    pub billing_period_end: Option<NaiveDate>,
    /// Outcome.
    pub status: PaymentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Actual spend in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPaid {
    /// `YYYY-MM`.
    pub period: String,
    /// Converted total of successful payments.
    pub amount: Decimal,
    /// Successful payments counted.
    pub payment_count: usize,
}

/// Successful payments charged twice for the same period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePaymentGroup {
    /// Subscription charged.
    pub subscription_id: SubscriptionId,
    /// Billing period start, or payment date when no period is recorded.
    pub period_start: NaiveDate,
    /// Records in the group, oldest first.
    pub payment_ids: Vec<PaymentRecordId>,
}

/// Summary of recorded payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistorySummary {
    /// Converted total of successful payments.
    pub total_paid: Decimal,
    /// Successful payments.
    pub payment_count: usize,
    /// Failed payments.
    pub failed_count: usize,
    /// Pending payments.
    pub pending_count: usize,
    /// Spend per month, oldest first.
    pub monthly: Vec<MonthlyPaid>,
    /// Suspected double charges.
    pub duplicates: Vec<DuplicatePaymentGroup>,
}

/// Derives summaries from payment records.
pub struct PaymentHistoryAnalyzer;

impl PaymentHistoryAnalyzer {
    /// Summarizes payments dated within `[start, end]`.
    #[must_use]
    pub fn summarize(
        records: &[PaymentRecord],
        rates: &RateMap,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PaymentHistorySummary {
        let in_range: Vec<&PaymentRecord> = records
            .iter()
            .filter(|r| r.payment_date >= start && r.payment_date <= end)
            .collect();

        let mut months: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        let mut summary = PaymentHistorySummary::default();

        for record in &in_range {
            match record.status {
                PaymentStatus::Success => {
                    let amount = convert(record.amount_paid, record.currency.as_str(), target, rates);
                    total = add_money(total, amount);
                    summary.payment_count += 1;
                    let entry = months
                        .entry(record.payment_date.format("%Y-%m").to_string())
                        .or_insert((Decimal::ZERO, 0));
                    entry.0 = add_money(entry.0, amount);
                    entry.1 += 1;
                }
                PaymentStatus::Failed => summary.failed_count += 1,
                PaymentStatus::Pending => summary.pending_count += 1,
            }
        }

        summary.total_paid = round_money(total);
        summary.monthly = months
            .into_iter()
            .map(|(period, (amount, count))| MonthlyPaid {
                period,
                amount: round_money(amount),
                payment_count: count,
            })
            .collect();
        summary.duplicates = Self::find_duplicates(in_range.into_iter());
        summary
    }

    /// Groups successful payments of one subscription covering the same
    /// period. Only groups with more than one record are returned.
    pub fn find_duplicates<'a>(
        records: impl Iterator<Item = &'a PaymentRecord>,
    ) -> Vec<DuplicatePaymentGroup> {
        let mut groups: BTreeMap<(SubscriptionId, NaiveDate), Vec<&PaymentRecord>> = BTreeMap::new();

        for record in records.filter(|r| r.status == PaymentStatus::Success) {
            let period = record.billing_period_start.unwrap_or(record.payment_date);
            groups
                .entry((record.subscription_id, period))
                .or_default()
                .push(record);
        }

        groups
            .into_iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|((subscription_id, period_start), mut records)| {
                records.sort_by_key(|r| (r.payment_date, r.id));
                DuplicatePaymentGroup {
                    subscription_id,
                    period_start,
                    payment_ids: records.into_iter().map(|r| r.id).collect(),
                }
            })
            .collect()
    }
}
