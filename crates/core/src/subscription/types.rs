//! Subscription, category and payment-method types.
//!
//! These are the strongly-typed records every computation runs on; rows
//! from the store are decoded into them at the repository boundary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtrack_shared::types::{CategoryId, CurrencyCode, PaymentMethodId, SubscriptionId, UserId};

use crate::billing::BillingCycle;

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Counted in every spend aggregate.
    Active,
    /// Kept for history, excluded from spend.
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown subscription status: {other}")),
        }
    }
}

/// A recurring expense tracked for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Charge per billing cycle, never negative.
    pub amount: Decimal,
    /// Currency the charge is billed in.
    pub currency: CurrencyCode,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// Next scheduled charge.
    pub next_billing_date: Option<NaiveDate>,
    /// Most recent charge.
    pub last_billing_date: Option<NaiveDate>,
    /// First day the subscription existed.
    pub start_date: Option<NaiveDate>,
    /// Category reference.
    pub category_id: Option<CategoryId>,
    /// Payment method reference.
    pub payment_method_id: Option<PaymentMethodId>,
}

impl Subscription {
    /// Returns true if the subscription counts towards spend.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Returns true if the subscription existed on `date`.
    ///
    /// A subscription without a start date is treated as having always existed.
    #[must_use]
    pub fn started_on_or_before(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= date)
    }
}

/// A spending category, either a shared system default or user-owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Short stable key (e.g. `video`).
    pub value: String,
    /// Human label.
    pub label: String,
    /// Owner; `None` for system defaults.
    pub user_id: Option<UserId>,
}

impl Category {
    /// Returns true for shared system-default categories.
    #[must_use]
    pub fn is_system_default(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            SubscriptionStatus::from_str("active").unwrap(),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_str("Canceled").unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert!(SubscriptionStatus::from_str("paused").is_err());
    }
}
