//! Session types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtrack_shared::types::UserId;
use thiserror::Error;

/// Default lead time before expiry at which a refresh is attempted.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);
/// Default idle time after which the user is signed out.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Default period of the inactivity check.
pub const DEFAULT_INACTIVITY_CHECK_INTERVAL: Duration = Duration::from_secs(60);
/// Shortest delay between two successful refreshes.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Tokens issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub access_token: String,
    /// Token used to obtain a new access token.
    pub refresh_token: String,
    /// Signed-in user.
    pub user_id: UserId,
    /// User email, if the provider shares it.
    pub email: Option<String>,
    /// When `access_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Time left until expiry; zero once expired.
    #[must_use]
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Where the session manager currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session.
    Anonymous,
    /// Valid session, refresh not yet due.
    Authenticated,
    /// Refresh in progress.
    Expiring,
    /// Refresh failed; the user was signed out.
    Expired,
}

impl SessionState {
    /// Returns true while a session is held.
    #[must_use]
    pub const fn is_signed_in(self) -> bool {
        matches!(self, Self::Authenticated | Self::Expiring)
    }
}

/// Auth-state changes announced by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in.
    SignedIn(Session),
    /// The session ended.
    SignedOut,
    /// The provider refreshed the tokens on its own.
    TokenRefreshed(Session),
}

/// User interactions that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    /// Pointer moved.
    MouseMove,
    /// Pointer pressed.
    MouseDown,
    /// Key pressed.
    KeyPress,
    /// Page scrolled.
    Scroll,
    /// Touch started.
    TouchStart,
    /// Element clicked.
    Click,
}

impl ActivityEvent {
    /// Every event the watchdog listens to.
    pub const ALL: [Self; 6] = [
        Self::MouseMove,
        Self::MouseDown,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutReason {
    /// The user asked.
    User,
    /// No activity for longer than the inactivity timeout.
    Inactivity,
    /// The token could not be refreshed.
    RefreshFailed,
    /// Another manager sharing the marker signed out.
    OtherTab,
    /// The identity provider reported sign-out.
    Provider,
}

/// Errors reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// There is no session to act on.
    #[error("No active session")]
    NoSession,

    /// The refresh token was rejected.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    /// Provider unreachable or returned an error.
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Session timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Refresh this long before expiry.
    pub refresh_threshold: Duration,
    /// Sign out after this much idle time.
    pub inactivity_timeout: Duration,
    /// How often idle time is checked.
    pub inactivity_check_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            inactivity_check_interval: DEFAULT_INACTIVITY_CHECK_INTERVAL,
        }
    }
}
