//! Renewal reminder dispatch.
//!
//! A batch scans subscriptions renewing soon, drops reminders already sent
//! for the same billing date, folds the rest into one digest per user and
//! hands each digest to an [`EmailSender`](subtrack_shared::email::EmailSender).
//! Persistence sits behind [`NotificationStore`].

pub mod dispatcher;
pub mod planner;
pub mod store;
pub mod types;


pub use dispatcher::{DispatchError, DispatchSettings, NotificationDispatcher};
pub use planner::{DigestPlan, plan_digests};
pub use store::{NotificationStore, StoreError};
pub use types::*;
