//! `SeaORM` Entity for notification_logs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub billing_date: Date,
    pub recipient: String,
    pub template_key: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::notification_batches::Entity",
        from = "Column::BatchId",
        to = "super::notification_batches::Column::Id"
    )]
    NotificationBatches,
}

impl Related<super::notification_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
