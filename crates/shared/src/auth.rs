//! Authentication types for identity-provider tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// JWT claims carried by identity-provider access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email, when the provider includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Provider role string (`authenticated`, `admin`, `service_role`).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: Option<&str>, role: Role, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.map(String::from),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the parsed role.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_claim(&self.role)
    }
}

/// Coarse RBAC roles recognised by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular signed-in end user.
    Authenticated,
    /// Admin console operator.
    Admin,
    /// Backend service (external scheduler, cron).
    Service,
}

impl Role {
    /// Maps a provider role claim onto a role; unknown values are plain users.
    #[must_use]
    pub fn from_claim(role: &str) -> Self {
        match role {
            "admin" => Self::Admin,
            "service_role" => Self::Service,
            _ => Self::Authenticated,
        }
    }

    /// Returns the claim string for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Admin => "admin",
            Self::Service => "service_role",
        }
    }

    /// Whether this role may trigger batch jobs.
    #[must_use]
    pub const fn can_run_jobs(self) -> bool {
        matches!(self, Self::Admin | Self::Service)
    }
}
