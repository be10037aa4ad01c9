use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Leave request moving through pending_manager → pending_hr →
/// approved | rejected | cancelled. Per-stage actors and timestamps are
/// stamped on transition; every action is also logged in
/// `leave_request_actions`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leave_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub working_days: Decimal,
    pub reason: Option<String>,
    pub status: String,
    pub manager_id: Option<i64>,
    pub manager_decided_at: Option<DateTime<Utc>>,
    pub hr_employee_id: Option<i64>,
    pub hr_decided_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::leave_type::Entity",
        from = "Column::LeaveTypeId",
        to = "super::leave_type::Column::Id"
    )]
    LeaveType,
    #[sea_orm(has_many = "super::leave_request_action::Entity")]
    Actions,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::leave_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveType.def()
    }
}

impl Related<super::leave_request_action::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    PendingManager,
    PendingHr,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Legal state-machine edges.
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!(
            (self, next),
            (PendingManager, PendingHr)
                | (PendingManager, Rejected)
                | (PendingManager, Cancelled)
                | (PendingHr, Approved)
                | (PendingHr, Rejected)
                | (PendingHr, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LeaveStatus::*;
    use std::str::FromStr;

    #[test]
    fn status_strings_are_snake_case() {
        assert_eq!(PendingManager.to_string(), "pending_manager");
        assert_eq!(
            super::LeaveStatus::from_str("pending_hr").unwrap(),
            PendingHr
        );
    }

    #[test]
    fn only_listed_edges_are_legal() {
        assert!(PendingManager.can_transition_to(PendingHr));
        assert!(PendingHr.can_transition_to(Approved));
        assert!(!PendingManager.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Cancelled));
        assert!(!Rejected.can_transition_to(PendingHr));
    }

    #[test]
    fn terminal_states() {
        assert!(Approved.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!PendingManager.is_terminal());
    }
}
