use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Support ticket. SLA due timestamps are derived from the matched policy at
/// creation; breach timestamps are stamped by the periodic sweep.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ticket_number: String,
    pub subject: String,
    pub description: Option<String>,
    pub client_id: Option<i64>,
    pub requester_email: Option<String>,
    pub status: String,
    pub priority: String,
    pub category_id: Option<i64>,
    pub queue_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub sla_policy_id: Option<i64>,
    pub first_response_due_at: Option<DateTime<Utc>>,
    pub resolution_due_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub first_response_breached_at: Option<DateTime<Utc>>,
    pub resolution_breached_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::ticket_attachment::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::ticket_watcher::Entity")]
    Watchers,
    #[sea_orm(
        belongs_to = "super::ticket_category::Entity",
        from = "Column::CategoryId",
        to = "super::ticket_category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::ticket_queue::Entity",
        from = "Column::QueueId",
        to = "super::ticket_queue::Column::Id"
    )]
    Queue,
    #[sea_orm(
        belongs_to = "super::ticket_sla_policy::Entity",
        from = "Column::SlaPolicyId",
        to = "super::ticket_sla_policy::Column::Id"
    )]
    SlaPolicy,
}

impl Related<super::ticket_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::ticket_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::ticket_watcher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Watchers.def()
    }
}

impl Related<super::ticket_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ticket_queue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Queue.def()
    }
}

impl Related<super::ticket_sla_policy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SlaPolicy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
    Cancelled,
}

impl TicketStatus {
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, Pending)
                | (Open, Resolved)
                | (Open, Cancelled)
                | (Pending, Open)
                | (Pending, Resolved)
                | (Pending, Cancelled)
                | (Resolved, Closed)
                | (Resolved, Open)
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

#[cfg(test)]
mod tests {
    use super::{TicketPriority, TicketStatus::*};
    use std::str::FromStr;

    #[test]
    fn reopening_is_allowed_from_resolved() {
        assert!(Resolved.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Open));
    }

    #[test]
    fn priority_parses_from_snake_case() {
        assert_eq!(
            TicketPriority::from_str("urgent").unwrap(),
            TicketPriority::Urgent
        );
        assert!(TicketPriority::from_str("catastrophic").is_err());
    }
}
