//! `SeaORM` entity definitions.
//!
//! `subscriptions`, `categories`, `payment_methods`, `payment_history`,
//! `exchange_rates`, `exchange_rate_update_logs` and `users` belong to the
//! shared application schema; `notification_batches` and `notification_logs`
//! are created by this crate's migrations.

pub mod prelude;

pub mod categories;
pub mod exchange_rate_update_logs;
pub mod exchange_rates;
pub mod notification_batches;
pub mod notification_logs;
pub mod payment_history;
pub mod payment_methods;
pub mod subscriptions;
pub mod users;
