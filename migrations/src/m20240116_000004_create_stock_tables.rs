use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240116_000004_create_stock_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Providers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Providers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Providers::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Providers::Email).string_len(255).null())
                    .col(ColumnDef::new(Providers::Phone).string_len(64).null())
                    .col(ColumnDef::new(Providers::VatNumber).string_len(64).null())
                    .col(ColumnDef::new(Providers::Street).string_len(255).null())
                    .col(ColumnDef::new(Providers::City).string_len(128).null())
                    .col(ColumnDef::new(Providers::PostalCode).string_len(32).null())
                    .col(ColumnDef::new(Providers::Country).string_len(64).null())
                    .col(ColumnDef::new(Providers::Notes).text().null())
                    .col(
                        ColumnDef::new(Providers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Providers::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Providers::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Providers::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovementReasons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovementReasons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockMovementReasons::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(StockMovementReasons::Description).text().null())
                    .col(
                        ColumnDef::new(StockMovementReasons::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(StockMovementReasons::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(StockMovementReasons::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::VariantId).big_integer().null())
                    .col(
                        ColumnDef::new(StockMovements::ReasonId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::ProviderId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                    .col(ColumnDef::new(StockMovements::Note).text().null())
                    .col(ColumnDef::new(StockMovements::MovedAt).timestamp().not_null())
                    .col(ColumnDef::new(StockMovements::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_reason")
                            .from(StockMovements::Table, StockMovements::ReasonId)
                            .to(StockMovementReasons::Table, StockMovementReasons::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_provider")
                            .from(StockMovements::Table, StockMovements::ProviderId)
                            .to(Providers::Table, Providers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_product")
                    .table(StockMovements::Table)
                    .col(StockMovements::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovementAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovementAttachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockMovementAttachments::StockMovementId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovementAttachments::StorageKey)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovementAttachments::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovementAttachments::MimeType)
                            .string_len(127)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockMovementAttachments::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movement_attachments_movement")
                            .from(
                                StockMovementAttachments::Table,
                                StockMovementAttachments::StockMovementId,
                            )
                            .to(StockMovements::Table, StockMovements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            StockMovementAttachments::Table.into_iden(),
            StockMovements::Table.into_iden(),
            StockMovementReasons::Table.into_iden(),
            Providers::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Providers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    VatNumber,
    Street,
    City,
    PostalCode,
    Country,
    Notes,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum StockMovementReasons {
    Table,
    Id,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum StockMovements {
    Table,
    Id,
    ProductId,
    VariantId,
    ReasonId,
    ProviderId,
    Quantity,
    Note,
    MovedAt,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum StockMovementAttachments {
    Table,
    Id,
    StockMovementId,
    StorageKey,
    FileName,
    MimeType,
    CreatedAt,
}
