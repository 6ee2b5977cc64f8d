//! Identity provider seam.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::types::{AuthError, AuthEvent, Session};

/// The four operations the session manager needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the current session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Exchanges the refresh token for a new session.
    async fn refresh_session(&self) -> Result<Session, AuthError>;

    /// Ends the session at the provider.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribes to auth-state changes.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;
}
