use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240610_000012_rework_ticketing"
    }
}

/// Helpdesk rework: `client_support_tickets` becomes `tickets` and gains SLA
/// tracking, categories, queues, assignees, tags, watchers and attachments.
/// Columns are added one per statement so the migration also runs on SQLite.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .rename_table(
                Table::rename()
                    .table(ClientSupportTickets::Table, Tickets::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TicketCategories::Description).text().null())
                    .col(
                        ColumnDef::new(TicketCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TicketCategories::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketQueues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketQueues::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketQueues::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TicketQueues::Description).text().null())
                    .col(
                        ColumnDef::new(TicketQueues::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketQueues::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TicketQueues::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketSlaPolicies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketSlaPolicies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::Name)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::Priority)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::CategoryId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::FirstResponseMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::ResolutionMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketSlaPolicies::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TicketSlaPolicies::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_sla_policies_category")
                            .from(TicketSlaPolicies::Table, TicketSlaPolicies::CategoryId)
                            .to(TicketCategories::Table, TicketCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One column per ALTER so SQLite accepts each statement.
        for column in [
            ColumnDef::new(Tickets::CategoryId).big_integer().null().to_owned(),
            ColumnDef::new(Tickets::QueueId).big_integer().null().to_owned(),
            ColumnDef::new(Tickets::AssigneeId).big_integer().null().to_owned(),
            ColumnDef::new(Tickets::SlaPolicyId).big_integer().null().to_owned(),
            ColumnDef::new(Tickets::FirstResponseDueAt).timestamp().null().to_owned(),
            ColumnDef::new(Tickets::ResolutionDueAt).timestamp().null().to_owned(),
            ColumnDef::new(Tickets::FirstResponseAt).timestamp().null().to_owned(),
            ColumnDef::new(Tickets::FirstResponseBreachedAt)
                .timestamp()
                .null()
                .to_owned(),
            ColumnDef::new(Tickets::ResolutionBreachedAt)
                .timestamp()
                .null()
                .to_owned(),
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Tickets::Table)
                        .add_column(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_status_priority")
                    .table(Tickets::Table)
                    .col(Tickets::Status)
                    .col(Tickets::Priority)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketTags::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketTags::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TicketTags::Color).string_len(16).null())
                    .col(
                        ColumnDef::new(TicketTags::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketTagLinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TicketTagLinks::TicketId).uuid().not_null())
                    .col(ColumnDef::new(TicketTagLinks::TagId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(TicketTagLinks::TicketId)
                            .col(TicketTagLinks::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_tag_links_ticket")
                            .from(TicketTagLinks::Table, TicketTagLinks::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_tag_links_tag")
                            .from(TicketTagLinks::Table, TicketTagLinks::TagId)
                            .to(TicketTags::Table, TicketTags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketWatchers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketWatchers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketWatchers::TicketId).uuid().not_null())
                    .col(
                        ColumnDef::new(TicketWatchers::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketWatchers::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_watchers_ticket")
                            .from(TicketWatchers::Table, TicketWatchers::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ticket_watchers_ticket_employee")
                    .table(TicketWatchers::Table)
                    .col(TicketWatchers::TicketId)
                    .col(TicketWatchers::EmployeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketAttachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketAttachments::TicketId).uuid().not_null())
                    .col(
                        ColumnDef::new(TicketAttachments::CommentId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketAttachments::StorageKey)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketAttachments::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketAttachments::MimeType)
                            .string_len(127)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketAttachments::SizeBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketAttachments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_attachments_ticket")
                            .from(TicketAttachments::Table, TicketAttachments::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            TicketAttachments::Table.into_iden(),
            TicketWatchers::Table.into_iden(),
            TicketTagLinks::Table.into_iden(),
            TicketTags::Table.into_iden(),
            TicketSlaPolicies::Table.into_iden(),
            TicketQueues::Table.into_iden(),
            TicketCategories::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }

        for column in [
            Tickets::ResolutionBreachedAt.into_iden(),
            Tickets::FirstResponseBreachedAt.into_iden(),
            Tickets::FirstResponseAt.into_iden(),
            Tickets::ResolutionDueAt.into_iden(),
            Tickets::FirstResponseDueAt.into_iden(),
            Tickets::SlaPolicyId.into_iden(),
            Tickets::AssigneeId.into_iden(),
            Tickets::QueueId.into_iden(),
            Tickets::CategoryId.into_iden(),
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Tickets::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .rename_table(
                Table::rename()
                    .table(Tickets::Table, ClientSupportTickets::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
pub enum ClientSupportTickets {
    Table,
}

#[derive(DeriveIden)]
pub enum Tickets {
    Table,
    Id,
    Status,
    Priority,
    CategoryId,
    QueueId,
    AssigneeId,
    SlaPolicyId,
    FirstResponseDueAt,
    ResolutionDueAt,
    FirstResponseAt,
    FirstResponseBreachedAt,
    ResolutionBreachedAt,
}

#[derive(DeriveIden)]
pub enum TicketCategories {
    Table,
    Id,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketQueues {
    Table,
    Id,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketSlaPolicies {
    Table,
    Id,
    Name,
    Priority,
    CategoryId,
    FirstResponseMinutes,
    ResolutionMinutes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketTags {
    Table,
    Id,
    Name,
    Color,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum TicketTagLinks {
    Table,
    TicketId,
    TagId,
}

#[derive(DeriveIden)]
pub enum TicketWatchers {
    Table,
    Id,
    TicketId,
    EmployeeId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum TicketAttachments {
    Table,
    Id,
    TicketId,
    CommentId,
    StorageKey,
    FileName,
    MimeType,
    SizeBytes,
    CreatedAt,
}
