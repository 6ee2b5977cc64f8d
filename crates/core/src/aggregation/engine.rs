//! Aggregation engine.

use std::collections::HashMap;

use chrono::{Days, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::types::{
    AggregationOptions, AggregationResult, CategoryBreakdown, OTHER_CATEGORY,
    OTHER_CATEGORY_LABEL, RecentPayment, UpcomingRenewal,
};
use crate::billing::{to_monthly, to_yearly};
use crate::currency::{RateMap, add_money, convert, round_money, sum_money};
use crate::subscription::{Category, Subscription};

/// Computes dashboard aggregates.
pub struct AggregationEngine;

impl AggregationEngine {
    /// Aggregates active subscriptions into the display currency.
    ///
    /// `rates` must come from a single snapshot date. Conversion and
    /// normalization problems on individual rows fall back per row; this
    /// function never fails.
    #[must_use]
    pub fn aggregate(
        subscriptions: &[Subscription],
        categories: &[Category],
        rates: &RateMap,
        options: &AggregationOptions,
    ) -> AggregationResult {
        let target = options.target_currency.as_str();
        let active: Vec<&Subscription> = subscriptions.iter().filter(|s| s.is_active()).collect();

        let mut monthly_total = Decimal::ZERO;
        let mut yearly_converted = Vec::with_capacity(active.len());

        for sub in &active {
            let from = sub.currency.as_str();
            let monthly = to_monthly(sub.amount, &sub.billing_cycle);
            let yearly = to_yearly(sub.amount, &sub.billing_cycle);
            monthly_total = add_money(monthly_total, convert(monthly, from, target, rates));
            yearly_converted.push((*sub, convert(yearly, from, target, rates)));
        }

        let yearly_total = sum_money(yearly_converted.iter().map(|(_, amount)| *amount));

        let category_breakdown = if options.include_category_breakdown {
            Self::category_breakdown(yearly_converted.iter().copied(), categories)
        } else {
            Vec::new()
        };

        let upcoming_renewals = if options.include_upcoming_renewals {
            Self::upcoming_renewals(&active, rates, options)
        } else {
            Vec::new()
        };

        let recently_paid = if options.include_recently_paid {
            Self::recently_paid(&active, rates, options)
        } else {
            Vec::new()
        };

        debug!(
            active = active.len(),
            currency = target,
            monthly = %monthly_total,
            yearly = %yearly_total,
            "Aggregated subscriptions"
        );

        AggregationResult {
            monthly_spending: round_money(monthly_total),
            yearly_spending: round_money(yearly_total),
            active_subscriptions: active.len(),
            upcoming_renewals,
            recently_paid,
            category_breakdown,
            currency: target.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Groups already-converted amounts by category and computes shares.
    ///
    /// Subscriptions without a category, or whose category is not in
    /// `categories`, land in the `other` group. Output is sorted by amount,
    /// largest first; ties by category key.
    #[must_use]
    pub fn category_breakdown<'a>(
        amounts: impl IntoIterator<Item = (&'a Subscription, Decimal)>,
        categories: &[Category],
    ) -> Vec<CategoryBreakdown> {
        let lookup: HashMap<_, _> = categories.iter().map(|c| (c.id, c)).collect();
        let mut groups: HashMap<String, (String, Decimal, usize)> = HashMap::new();

        for (sub, amount) in amounts {
            let (key, label) = sub
                .category_id
                .and_then(|id| lookup.get(&id))
                .map_or((OTHER_CATEGORY, OTHER_CATEGORY_LABEL), |c| {
                    (c.value.as_str(), c.label.as_str())
                });
            let entry = groups
                .entry(key.to_string())
                .or_insert_with(|| (label.to_string(), Decimal::ZERO, 0));
            entry.1 = add_money(entry.1, amount);
            entry.2 += 1;
        }

        let total = sum_money(groups.values().map(|(_, amount, _)| *amount));

        let mut breakdown: Vec<CategoryBreakdown> = groups
            .into_iter()
            .map(|(category, (label, amount, count))| CategoryBreakdown {
                category,
                label,
                amount: round_money(amount),
                percentage: Self::percentage(amount, total),
                subscription_count: count,
            })
            .collect();

        breakdown.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.category.cmp(&b.category))
        });
        breakdown
    }

    fn percentage(part: Decimal, total: Decimal) -> Decimal {
        if total.is_zero() {
            Decimal::ZERO
        } else {
            part.checked_div(total)
                .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                .map_or(Decimal::ZERO, round_money)
        }
    }

    fn upcoming_renewals(
        active: &[&Subscription],
        rates: &RateMap,
        options: &AggregationOptions,
    ) -> Vec<UpcomingRenewal> {
        let target = options.target_currency.as_str();
        let today = options.today;
        let until = today
            .checked_add_days(Days::new(u64::from(options.upcoming_days)))
            .unwrap_or(today);

        let mut renewals: Vec<UpcomingRenewal> = active
            .iter()
            .filter_map(|sub| {
                let date = sub.next_billing_date?;
                if date < today || date > until {
                    return None;
                }
                Some(UpcomingRenewal {
                    id: sub.id,
                    name: sub.name.clone(),
                    amount: round_money(convert(sub.amount, sub.currency.as_str(), target, rates)),
                    currency: target.to_string(),
                    original_amount: sub.amount,
                    original_currency: sub.currency.to_string(),
                    billing_cycle: sub.billing_cycle.clone(),
                    next_billing_date: date,
                    days_until: (date - today).num_days(),
                })
            })
            .collect();

        renewals.sort_by(|a, b| {
            a.next_billing_date
                .cmp(&b.next_billing_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        renewals
    }

    fn recently_paid(
        active: &[&Subscription],
        rates: &RateMap,
        options: &AggregationOptions,
    ) -> Vec<RecentPayment> {
        let target = options.target_currency.as_str();
        let today = options.today;
        let since = today
            .checked_sub_days(Days::new(u64::from(options.recent_days)))
            .unwrap_or(today);

        let mut paid: Vec<RecentPayment> = active
            .iter()
            .filter_map(|sub| {
                let date = sub.last_billing_date?;
                if date < since || date > today {
                    return None;
                }
                Some(RecentPayment {
                    id: sub.id,
                    name: sub.name.clone(),
                    amount: round_money(convert(sub.amount, sub.currency.as_str(), target, rates)),
                    currency: target.to_string(),
                    original_amount: sub.amount,
                    original_currency: sub.currency.to_string(),
                    billing_cycle: sub.billing_cycle.clone(),
                    last_billing_date: date,
                })
            })
            .collect();

        paid.sort_by(|a, b| {
            b.last_billing_date
                .cmp(&a.last_billing_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        paid
    }
}
