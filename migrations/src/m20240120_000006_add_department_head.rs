use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use super::m20240120_000005_create_hr_tables::{Departments, Employees};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240120_000006_add_department_head"
    }
}

/// Departments and employees reference each other, so the head column (and
/// its constraint) can only be added after both tables exist.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Departments::Table)
                    .add_column(ColumnDef::new(DepartmentHead::HeadEmployeeId).big_integer().null())
                    .to_owned(),
            )
            .await?;

        // SQLite cannot add a foreign key to an existing table; the reference
        // stays application-enforced there.
        if manager.get_database_backend() != DatabaseBackend::Sqlite {
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_departments_head_employee")
                        .from(Departments::Table, DepartmentHead::HeadEmployeeId)
                        .to(Employees::Table, Employees::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Sqlite {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name("fk_departments_head_employee")
                        .table(Departments::Table)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Departments::Table)
                    .drop_column(DepartmentHead::HeadEmployeeId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum DepartmentHead {
    HeadEmployeeId,
}
