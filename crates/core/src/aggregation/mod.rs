//! Dashboard spending aggregation.
//!
//! Turns a user's subscriptions plus one exchange-rate snapshot into
//! monthly/yearly totals, a category breakdown and renewal lists, all in a
//! single display currency.

pub mod engine;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::AggregationEngine;
pub use types::*;
