//! JSON error envelope for handlers.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use subtrack_db::RepositoryError;
use subtrack_shared::AppError;
use tracing::error;

/// Handler error rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Logs server-side failures; client errors are not logged.
    pub(crate) fn log(&self) {
        if self.status().is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

/// Unwraps a loader error shared by coalesced cache callers.
pub(crate) fn from_shared(err: Arc<RepositoryError>) -> AppError {
    match Arc::try_unwrap(err) {
        Ok(err) => err.into(),
        Err(shared) => AppError::Database(shared.to_string()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (
            self.status(),
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error", "bad")]
    #[case(AppError::AlreadyRunning("batch".into()), StatusCode::CONFLICT, "already_running", "batch")]
    #[case(AppError::Forbidden("no".into()), StatusCode::FORBIDDEN, "forbidden", "no")]
    #[case(AppError::Database("pool timeout".into()), StatusCode::INTERNAL_SERVER_ERROR, "database_error", "An error occurred")]
    #[tokio::test]
    async fn test_error_envelope(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
        #[case] message: &str,
    ) {
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), status);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], code);
        assert_eq!(json["message"], message);
    }

    #[test]
    fn test_from_shared_unwraps_sole_owner() {
        let err = Arc::new(RepositoryError::Database(sea_orm::DbErr::Custom("down".into())));
        assert!(matches!(from_shared(err), AppError::Database(_)));
    }
}
