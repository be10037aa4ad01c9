use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240205_000008_create_client_support_tickets"
    }
}

/// First cut of the helpdesk: a flat ticket table plus comments. The module
/// was reworked later (rename to `tickets`, SLA fields, categories, queues);
/// see m20240610_000012_rework_ticketing.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClientSupportTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClientSupportTickets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::TicketNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::Subject)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClientSupportTickets::Description).text().null())
                    .col(
                        ColumnDef::new(ClientSupportTickets::ClientId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::RequesterEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::Status)
                            .string_len(32)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::Priority)
                            .string_len(16)
                            .not_null()
                            .default("normal"),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::ResolvedAt)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::ClosedAt)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ClientSupportTickets::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketComments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketComments::TicketId).uuid().not_null())
                    .col(
                        ColumnDef::new(TicketComments::AuthorEmployeeId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketComments::AuthorName)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(TicketComments::Body).text().not_null())
                    .col(
                        ColumnDef::new(TicketComments::IsInternal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TicketComments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_comments_ticket")
                            .from(TicketComments::Table, TicketComments::TicketId)
                            .to(ClientSupportTickets::Table, ClientSupportTickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClientSupportTickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ClientSupportTickets {
    Table,
    Id,
    TicketNumber,
    Subject,
    Description,
    ClientId,
    RequesterEmail,
    Status,
    Priority,
    ResolvedAt,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketComments {
    Table,
    Id,
    TicketId,
    AuthorEmployeeId,
    AuthorName,
    Body,
    IsInternal,
    CreatedAt,
}
