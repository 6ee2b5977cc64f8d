//! Billing-cycle normalization.
//!
//! Converts a per-charge amount into its monthly, quarterly or yearly
//! equivalent so subscriptions with different cycles can be summed.

mod cycle;
mod normalize;

#[cfg(test)]
mod props;

pub use cycle::BillingCycle;
pub use normalize::{sanitize_amount, to_monthly, to_quarterly, to_yearly};
