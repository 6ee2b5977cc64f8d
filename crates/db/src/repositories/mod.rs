//! Repository abstractions for data access.
//!
//! Repositories hide the `SeaORM` details and decode rows into the core
//! domain types. A row that cannot be decoded is logged and skipped so one
//! bad record never fails a whole listing.

pub mod category;
pub mod error;
pub mod exchange_rate;
pub mod notification;
pub mod payment_history;
pub mod subscription;


pub use category::CategoryRepository;
pub use error::RepositoryError;
pub use exchange_rate::{ExchangeRateRepository, RateUpdateLog, RateUpdateStatus};
pub use notification::NotificationRepository;
pub use payment_history::PaymentHistoryRepository;
pub use subscription::SubscriptionRepository;
