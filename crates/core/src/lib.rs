//! Core business logic for SubTrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, normalization rules, and calculations live here.
//!
//! # Modules
//!
//! - `subscription` - Subscription, category and payment-method domain types
//! - `currency` - Exchange-rate snapshots and currency conversion
//! - `billing` - Billing-cycle normalization to monthly/yearly amounts
//! - `aggregation` - Dashboard spending aggregates
//! - `reports` - Historical expense series
//! - `payments` - Payment-history analysis
//! - `cache` - Coalescing TTL cache for computed results
//! - `session` - Client session lifecycle (refresh, inactivity, cross-tab sync)
//! - `notification` - Renewal reminder digests

pub mod aggregation;
pub mod billing;
pub mod cache;
pub mod currency;
pub mod notification;
pub mod payments;
pub mod reports;
pub mod session;
pub mod subscription;

#[cfg(test)]
mod test_support;
