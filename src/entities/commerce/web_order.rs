use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Guest checkout order placed through the storefront. Lines are snapshotted
/// into the JSON `items` column at placement time; tracking is public via
/// order number + email.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "web_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub status: String,
    pub currency: String,
    #[sea_orm(column_type = "Json")]
    pub items: Json,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub promotion_code_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::web_order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::web_order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One line of a web order as stored in the `items` JSON column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebOrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}
