use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Money movement, planned or settled. `direction` is "in" or "out";
/// planned rows past `due_at` are flipped to overdue by the periodic sweep.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub label: String,
    pub direction: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub invoice_id: Option<i64>,
    pub client_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub due_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::financial_transaction_reminder::Entity")]
    Reminders,
    #[sea_orm(
        belongs_to = "crate::entities::commerce::invoice::Entity",
        from = "Column::InvoiceId",
        to = "crate::entities::commerce::invoice::Column::Id"
    )]
    Invoice,
    #[sea_orm(
        belongs_to = "crate::entities::commerce::client::Entity",
        from = "Column::ClientId",
        to = "crate::entities::commerce::client::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "crate::entities::stock::provider::Entity",
        from = "Column::ProviderId",
        to = "crate::entities::stock::provider::Column::Id"
    )]
    Provider,
}

impl Related<super::financial_transaction_reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    In,
    Out,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Planned,
    Paid,
    Overdue,
    Canceled,
}

impl TransactionStatus {
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Planned, Paid)
                | (Planned, Overdue)
                | (Planned, Canceled)
                | (Overdue, Paid)
                | (Overdue, Canceled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionStatus::*;

    #[test]
    fn settled_states_are_final() {
        assert!(!Paid.can_transition_to(Planned));
        assert!(!Canceled.can_transition_to(Paid));
        assert!(Overdue.can_transition_to(Paid));
    }
}
