use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit trail of web-order status changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "web_order_status_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub web_order_id: Uuid,
    pub old_status: Option<String>,
    pub new_status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::web_order::Entity",
        from = "Column::WebOrderId",
        to = "super::web_order::Column::Id"
    )]
    WebOrder,
}

impl Related<super::web_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
