//! Notification types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use subtrack_shared::email::{EmailRequest, TEMPLATE_RENEWAL_DIGEST, TEMPLATE_RENEWAL_REMINDER};
use subtrack_shared::types::{CurrencyCode, NotificationBatchId, SubscriptionId, UserId};

use crate::billing::BillingCycle;

/// Default look-ahead for reminders, in days.
pub const DEFAULT_REMINDER_DAYS: u32 = 3;

/// An active subscription renewing inside the reminder window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSubscription {
    /// Subscription.
    pub subscription_id: SubscriptionId,
    /// Owner.
    pub user_id: UserId,
    /// Owner email.
    pub recipient: String,
    /// Subscription name.
    pub name: String,
    /// Per-charge amount.
    pub amount: Decimal,
    /// Billing currency.
    pub currency: CurrencyCode,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Upcoming charge.
    pub next_billing_date: NaiveDate,
}

impl DueSubscription {
    /// Key identifying one reminder per billing cycle.
    #[must_use]
    pub const fn cycle_key(&self) -> (SubscriptionId, NaiveDate) {
        (self.subscription_id, self.next_billing_date)
    }
}

/// All reminders for one user in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Recipient user.
    pub user_id: UserId,
    /// Recipient email.
    pub recipient: String,
    /// Renewals, soonest first.
    pub items: Vec<DueSubscription>,
}

impl Digest {
    /// Single renewals get the reminder template, several get the digest.
    #[must_use]
    pub fn template_key(&self) -> &'static str {
        if self.items.len() == 1 {
            TEMPLATE_RENEWAL_REMINDER
        } else {
            TEMPLATE_RENEWAL_DIGEST
        }
    }

    /// Builds the email request.
    #[must_use]
    pub fn to_request(&self) -> EmailRequest {
        let items: Vec<serde_json::Value> = self
            .items
            .iter()
            .map(|item| {
                json!({
                    "subscriptionId": item.subscription_id,
                    "name": item.name,
                    "amount": item.amount.to_string(),
                    "currency": item.currency.as_str(),
                    "billingCycle": item.billing_cycle.as_str(),
                    "nextBillingDate": item.next_billing_date.to_string(),
                })
            })
            .collect();

        EmailRequest {
            recipient: self.recipient.clone(),
            template_key: self.template_key().to_string(),
            data: json!({
                "count": items.len(),
                "items": items,
            }),
        }
    }
}

/// Outcome of one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Email accepted by the transport.
    Sent,
    /// Email could not be sent.
    Failed,
}

impl DeliveryStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Audit row for one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLog {
    /// Batch that sent it.
    pub batch_id: NotificationBatchId,
    /// Recipient user.
    pub user_id: UserId,
    /// Subscription reminded about.
    pub subscription_id: SubscriptionId,
    /// Billing date the reminder covers.
    pub billing_date: NaiveDate,
    /// Recipient email.
    pub recipient: String,
    /// Template used.
    pub template_key: String,
    /// Outcome.
    pub status: DeliveryStatus,
    /// Transport error, if failed.
    pub error: Option<String>,
}

/// Final state of a batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// In progress; at most one at a time.
    Running,
    /// Finished, possibly with individual delivery failures.
    Completed,
    /// Aborted.
    Failed,
}

impl BatchStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Counters for a finished batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Batch ID.
    pub batch_id: NotificationBatchId,
    /// Subscriptions in the reminder window.
    pub due_subscriptions: usize,
    /// Reminders skipped because they were already sent.
    pub skipped_duplicates: usize,
    /// Users with at least one sent email.
    pub users_notified: usize,
    /// Emails sent.
    pub emails_sent: usize,
    /// Emails that failed.
    pub emails_failed: usize,
    /// Delivery logs that could not be written.
    pub logs_unrecorded: usize,
}

impl BatchSummary {
    /// Zeroed counters.
    #[must_use]
    pub const fn new(batch_id: NotificationBatchId) -> Self {
        Self {
            batch_id,
            due_subscriptions: 0,
            skipped_duplicates: 0,
            users_notified: 0,
            emails_sent: 0,
            emails_failed: 0,
            logs_unrecorded: 0,
        }
    }
}
