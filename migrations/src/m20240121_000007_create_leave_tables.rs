use sea_orm_migration::prelude::*;

use super::m20240120_000005_create_hr_tables::{Employees, LeaveTypes};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240121_000007_create_leave_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::LeaveTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(LeaveRequests::WorkingDays)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::Reason).text().null())
                    .col(
                        ColumnDef::new(LeaveRequests::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending_manager"),
                    )
                    .col(ColumnDef::new(LeaveRequests::ManagerId).big_integer().null())
                    .col(
                        ColumnDef::new(LeaveRequests::ManagerDecidedAt)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::HrEmployeeId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::HrDecidedAt).timestamp().null())
                    .col(ColumnDef::new(LeaveRequests::CancelledAt).timestamp().null())
                    .col(
                        ColumnDef::new(LeaveRequests::SubmittedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(LeaveRequests::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_employee")
                            .from(LeaveRequests::Table, LeaveRequests::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_type")
                            .from(LeaveRequests::Table, LeaveRequests::LeaveTypeId)
                            .to(LeaveTypes::Table, LeaveTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_requests_status")
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveRequestActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequestActions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequestActions::LeaveRequestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequestActions::ActorEmployeeId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequestActions::Action)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequestActions::FromStatus)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequestActions::ToStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequestActions::Comment).text().null())
                    .col(
                        ColumnDef::new(LeaveRequestActions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_request_actions_request")
                            .from(
                                LeaveRequestActions::Table,
                                LeaveRequestActions::LeaveRequestId,
                            )
                            .to(LeaveRequests::Table, LeaveRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveRequestActions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum LeaveRequests {
    Table,
    Id,
    EmployeeId,
    LeaveTypeId,
    StartDate,
    EndDate,
    WorkingDays,
    Reason,
    Status,
    ManagerId,
    ManagerDecidedAt,
    HrEmployeeId,
    HrDecidedAt,
    CancelledAt,
    SubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum LeaveRequestActions {
    Table,
    Id,
    LeaveRequestId,
    ActorEmployeeId,
    Action,
    FromStatus,
    ToStatus,
    Comment,
    CreatedAt,
}
