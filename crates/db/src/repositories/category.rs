//! Category repository.
//!
//! The table holds shared system defaults (`user_id IS NULL`) plus rows
//! owned by individual users.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use subtrack_core::subscription::Category;
use subtrack_shared::types::UserId;

use super::error::RepositoryError;
use super::subscription::decode_all;
use crate::entities::categories;

/// Decodes a stored category row.
pub fn decode_category(model: categories::Model) -> Result<Category, RepositoryError> {
    if model.value.trim().is_empty() {
        return Err(RepositoryError::decode("categories", model.id, "empty value"));
    }
    Ok(Category {
        id: model.id.into(),
        value: model.value,
        label: model.label,
        user_id: model.user_id.map(Into::into),
    })
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// System-default categories plus the user's own.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn categories_for_user(&self, user_id: UserId) -> Result<Vec<Category>, RepositoryError> {
        let models = categories::Entity::find()
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.is_null())
                    .add(categories::Column::UserId.eq(user_id.into_inner())),
            )
            .order_by_asc(categories::Column::Value)
            .all(&self.db)
            .await?;

        Ok(decode_all(models, decode_category))
    }
}
