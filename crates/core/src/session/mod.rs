//! Client session lifecycle.
//!
//! Tracks access-token expiry, refreshes proactively before it lapses,
//! signs out after a period of inactivity, and mirrors sign-in/sign-out
//! between managers sharing a [`SessionMarker`] (one per browser tab).
//!
//! State machine:
//!
//! ```text
//! Anonymous --signed in--> Authenticated --threshold reached--> Expiring
//! Expiring --refresh ok--> Authenticated
//! Expiring --refresh failed--> Expired (forced sign-out)
//! Authenticated --sign-out / idle / other tab--> Anonymous
//! ```

pub mod manager;
pub mod marker;
pub mod provider;
pub mod types;

#[cfg(test)]
mod tests;

pub use manager::SessionManager;
pub use marker::{MarkerEntry, MarkerKind, SessionMarker, TabId};
pub use provider::IdentityProvider;
pub use types::*;
