//! Aggregation input options and result types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtrack_shared::types::{CurrencyCode, SubscriptionId};

use crate::billing::BillingCycle;

/// Category key used when a subscription has no (known) category.
pub const OTHER_CATEGORY: &str = "other";
/// Label used when a subscription has no (known) category.
pub const OTHER_CATEGORY_LABEL: &str = "其他";

/// Default look-ahead window for upcoming renewals, in days.
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;
/// Default look-back window for recent payments, in days.
pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Parameters for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Display currency for every monetary output.
    pub target_currency: CurrencyCode,
    /// Reference day for the renewal windows.
    pub today: NaiveDate,
    /// Upcoming window length: `[today, today + upcoming_days]`.
    pub upcoming_days: u32,
    /// Recent window length: `[today - recent_days, today]`.
    pub recent_days: u32,
    /// Compute `upcoming_renewals`.
    pub include_upcoming_renewals: bool,
    /// Compute `recently_paid`.
    pub include_recently_paid: bool,
    /// Compute `category_breakdown`.
    pub include_category_breakdown: bool,
}

impl AggregationOptions {
    /// Options with default windows and every section enabled.
    #[must_use]
    pub fn new(target_currency: CurrencyCode, today: NaiveDate) -> Self {
        Self {
            target_currency,
            today,
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            recent_days: DEFAULT_RECENT_DAYS,
            include_upcoming_renewals: true,
            include_recently_paid: true,
            include_category_breakdown: true,
        }
    }
}

/// Spend attributed to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// Category key.
    pub category: String,
    /// Category label.
    pub label: String,
    /// Yearly spend in the display currency.
    pub amount: Decimal,
    /// Share of the grand total, 0..=100.
    pub percentage: Decimal,
    /// Number of subscriptions in the group.
    pub subscription_count: usize,
}

/// A subscription renewing within the upcoming window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingRenewal {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Subscription name.
    pub name: String,
    /// Per-charge amount in the display currency.
    pub amount: Decimal,
    /// Display currency.
    pub currency: String,
    /// Per-charge amount as billed.
    pub original_amount: Decimal,
    /// Billing currency.
    pub original_currency: String,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Renewal date.
    pub next_billing_date: NaiveDate,
    /// Days from today until renewal.
    pub days_until: i64,
}

/// A subscription charged within the recent window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPayment {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Subscription name.
    pub name: String,
    /// Per-charge amount in the display currency.
    pub amount: Decimal,
    /// Display currency.
    pub currency: String,
    /// Per-charge amount as billed.
    pub original_amount: Decimal,
    /// Billing currency.
    pub original_currency: String,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Charge date.
    pub last_billing_date: NaiveDate,
}

/// Dashboard aggregate for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Sum of monthly-normalized active spend.
    pub monthly_spending: Decimal,
    /// Sum of yearly-normalized active spend.
    pub yearly_spending: Decimal,
    /// Number of active subscriptions.
    pub active_subscriptions: usize,
    /// Renewals within the upcoming window, soonest first.
    pub upcoming_renewals: Vec<UpcomingRenewal>,
    /// Charges within the recent window, most recent first.
    pub recently_paid: Vec<RecentPayment>,
    /// Yearly spend per category, largest first.
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Display currency.
    pub currency: String,
    /// When the aggregate was computed.
    pub timestamp: DateTime<Utc>,
}

impl AggregationResult {
    /// Zeroed result, returned alongside a data-store failure.
    #[must_use]
    pub fn empty(currency: &str) -> Self {
        Self {
            monthly_spending: Decimal::ZERO,
            yearly_spending: Decimal::ZERO,
            active_subscriptions: 0,
            upcoming_renewals: Vec::new(),
            recently_paid: Vec::new(),
            category_breakdown: Vec::new(),
            currency: currency.to_string(),
            timestamp: Utc::now(),
        }
    }
}
