//! Digest planning: dedup per billing cycle, then group per user.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use subtrack_shared::types::SubscriptionId;
use tracing::warn;

use super::types::{Digest, DueSubscription};

/// Digests to send plus what was left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestPlan {
    /// One digest per user.
    pub digests: Vec<Digest>,
    /// Reminders already sent for the same billing date.
    pub skipped_duplicates: usize,
    /// Rows without a usable recipient address.
    pub skipped_no_recipient: usize,
}

/// Groups due subscriptions into one digest per user.
///
/// Entries whose `(subscription_id, next_billing_date)` is in `already_sent`
/// are skipped, as are repeated entries for the same key within `due`.
#[must_use]
pub fn plan_digests(
    due: Vec<DueSubscription>,
    already_sent: &HashSet<(SubscriptionId, NaiveDate)>,
) -> DigestPlan {
    let mut plan = DigestPlan::default();
    let mut seen = HashSet::new();
    let mut by_user: BTreeMap<_, Digest> = BTreeMap::new();

    for item in due {
        let key = item.cycle_key();
        if already_sent.contains(&key) || !seen.insert(key) {
            plan.skipped_duplicates += 1;
            continue;
        }
        if item.recipient.trim().is_empty() {
            warn!(subscription_id = %item.subscription_id, "No recipient email, skipping reminder");
            plan.skipped_no_recipient += 1;
            continue;
        }
        by_user
            .entry(item.user_id)
            .or_insert_with(|| Digest {
                user_id: item.user_id,
                recipient: item.recipient.clone(),
                items: Vec::new(),
            })
            .items
            .push(item);
    }

    plan.digests = by_user
        .into_values()
        .map(|mut digest| {
            digest.items.sort_by(|a, b| {
                a.next_billing_date
                    .cmp(&b.next_billing_date)
                    .then_with(|| a.name.cmp(&b.name))
            });
            digest
        })
        .collect();
    plan
}
