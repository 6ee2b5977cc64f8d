//! Entity re-exports.

pub use super::categories::Entity as Categories;
pub use super::exchange_rate_update_logs::Entity as ExchangeRateUpdateLogs;
pub use super::exchange_rates::Entity as ExchangeRates;
pub use super::notification_batches::Entity as NotificationBatches;
pub use super::notification_logs::Entity as NotificationLogs;
pub use super::payment_history::Entity as PaymentHistory;
pub use super::payment_methods::Entity as PaymentMethods;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::users::Entity as Users;
