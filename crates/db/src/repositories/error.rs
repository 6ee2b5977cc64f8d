//! Repository error type.

use sea_orm::DbErr;
use subtrack_shared::AppError;
use uuid::Uuid;

/// Errors raised by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A row violates the domain contract.
    #[error("Invalid {entity} row {id}: {reason}")]
    Decode {
        /// Table the row came from.
        entity: &'static str,
        /// Row ID.
        id: Uuid,
        /// What was wrong.
        reason: String,
    },
}

impl RepositoryError {
    pub(crate) fn decode(entity: &'static str, id: Uuid, reason: impl Into<String>) -> Self {
        Self::Decode {
            entity,
            id,
            reason: reason.into(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::Database(e.to_string()),
            RepositoryError::Decode { .. } => Self::Internal(err.to_string()),
        }
    }
}
