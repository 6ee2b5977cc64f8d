//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use subtrack_shared::types::UserId;
use subtrack_shared::{Claims, JwtError, Role};
use tracing::{debug, warn};

use crate::AppState;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates identity-provider JWTs.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized(
            "missing_token",
            "Authorization header with Bearer token is required",
        );
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => {
            debug!("Rejected expired token");
            unauthorized("token_expired", "Token has expired")
        }
        Err(e) => {
            debug!(error = %e, "Rejected invalid token");
            unauthorized("invalid_token", "Invalid or malformed token")
        }
    }
}

/// Lets only admin and service tokens through to batch job routes.
///
/// Must run after [`auth_middleware`].
pub async fn require_job_role(request: Request, next: Next) -> Response {
    let role = request.extensions().get::<Claims>().map(Claims::role);
    match role {
        Some(role) if role.can_run_jobs() => next.run(request).await,
        Some(role) => {
            warn!(role = role.as_str(), path = %request.uri().path(), "Job route denied");
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "Admin or service role required"
                })),
            )
                .into_response()
        }
        None => unauthorized("unauthorized", "Authentication required"),
    }
}

/// Extractor for authenticated user claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id()
    }

    /// Returns the user's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| unauthorized("unauthorized", "Authentication required"))
    }
}
