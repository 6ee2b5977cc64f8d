//! `SeaORM` Entity for notification_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: String,
    pub started_at: DateTimeWithTimeZone,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub due_subscriptions: i32,
    pub skipped_duplicates: i32,
    pub users_notified: i32,
    pub emails_sent: i32,
    pub emails_failed: i32,
    pub error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notification_logs::Entity")]
    NotificationLogs,
}

impl Related<super::notification_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
