use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000003_create_commerce_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Currencies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Currencies::Code)
                            .string_len(3)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Currencies::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Currencies::Symbol).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Currencies::DecimalPlaces)
                            .integer()
                            .not_null()
                            .default(2),
                    )
                    .col(
                        ColumnDef::new(Currencies::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Currencies::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Currencies::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaxRates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaxRates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaxRates::Name).string_len(64).not_null())
                    .col(ColumnDef::new(TaxRates::Rate).decimal_len(7, 4).not_null())
                    .col(
                        ColumnDef::new(TaxRates::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TaxRates::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TaxRates::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clients::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Clients::Email).string_len(255).null())
                    .col(ColumnDef::new(Clients::Phone).string_len(64).null())
                    .col(ColumnDef::new(Clients::VatNumber).string_len(64).null())
                    .col(ColumnDef::new(Clients::Street).string_len(255).null())
                    .col(ColumnDef::new(Clients::City).string_len(128).null())
                    .col(ColumnDef::new(Clients::PostalCode).string_len(32).null())
                    .col(ColumnDef::new(Clients::Country).string_len(64).null())
                    .col(ColumnDef::new(Clients::Notes).text().null())
                    .col(
                        ColumnDef::new(Clients::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Clients::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Clients::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Clients::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::ClientId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Orders::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Orders::Subtotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Orders::TaxTotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Orders::Total).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(ColumnDef::new(Orders::OrderedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_client")
                            .from(Orders::Table, Orders::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_client")
                    .table(Orders::Table)
                    .col(Orders::ClientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::VariantId).big_integer().null())
                    .col(
                        ColumnDef::new(OrderItems::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::TaxRate)
                            .decimal_len(7, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::Total).decimal_len(19, 4).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Quotes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Quotes::QuoteNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Quotes::ClientId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Quotes::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Quotes::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Quotes::Subtotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Quotes::TaxTotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Quotes::Total).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Quotes::ValidUntil).timestamp().null())
                    .col(ColumnDef::new(Quotes::Notes).text().null())
                    .col(ColumnDef::new(Quotes::ConvertedOrderId).big_integer().null())
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Quotes::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_client")
                            .from(Quotes::Table, Quotes::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuoteItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuoteItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuoteItems::QuoteId).big_integer().not_null())
                    .col(ColumnDef::new(QuoteItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(QuoteItems::VariantId).big_integer().null())
                    .col(
                        ColumnDef::new(QuoteItems::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuoteItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(QuoteItems::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuoteItems::TaxRate)
                            .decimal_len(7, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuoteItems::Total).decimal_len(19, 4).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quote_items_quote")
                            .from(QuoteItems::Table, QuoteItems::QuoteId)
                            .to(Quotes::Table, Quotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Invoices::InvoiceNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invoices::ClientId).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::OrderId).big_integer().null())
                    .col(
                        ColumnDef::new(Invoices::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Invoices::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Invoices::Subtotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Invoices::TaxTotal).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Invoices::Total).decimal_len(19, 4).not_null())
                    .col(ColumnDef::new(Invoices::IssuedAt).timestamp().null())
                    .col(ColumnDef::new(Invoices::DueAt).timestamp().null())
                    .col(ColumnDef::new(Invoices::PaidAt).timestamp().null())
                    .col(ColumnDef::new(Invoices::Notes).text().null())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Invoices::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_client")
                            .from(Invoices::Table, Invoices::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_order")
                            .from(Invoices::Table, Invoices::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::InvoiceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::ProductId).uuid().null())
                    .col(
                        ColumnDef::new(InvoiceItems::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::TaxRate)
                            .decimal_len(7, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::Total)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_items_invoice")
                            .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            InvoiceItems::Table.into_iden(),
            Invoices::Table.into_iden(),
            QuoteItems::Table.into_iden(),
            Quotes::Table.into_iden(),
            OrderItems::Table.into_iden(),
            Orders::Table.into_iden(),
            Clients::Table.into_iden(),
            TaxRates::Table.into_iden(),
            Currencies::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Currencies {
    Table,
    Id,
    Code,
    Name,
    Symbol,
    DecimalPlaces,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TaxRates {
    Table,
    Id,
    Name,
    Rate,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Clients {
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
pub enum Orders {
    Table,
    Id,
    OrderNumber,
    ClientId,
    Status,
    Currency,
    Subtotal,
    TaxTotal,
    Total,
    Notes,
    OrderedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    VariantId,
    Description,
    Quantity,
    UnitPrice,
    TaxRate,
    Total,
}

#[derive(DeriveIden)]
pub enum Quotes {
    Table,
    Id,
    QuoteNumber,
    ClientId,
    Status,
    Currency,
    Subtotal,
    TaxTotal,
    Total,
    ValidUntil,
    Notes,
    ConvertedOrderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum QuoteItems {
    Table,
    Id,
    QuoteId,
    ProductId,
    VariantId,
    Description,
    Quantity,
    UnitPrice,
    TaxRate,
    Total,
}

#[derive(DeriveIden)]
pub enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    ClientId,
    OrderId,
    Status,
    Currency,
    Subtotal,
    TaxTotal,
    Total,
    IssuedAt,
    DueAt,
    PaidAt,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum InvoiceItems {
    Table,
    Id,
    InvoiceId,
    ProductId,
    Description,
    Quantity,
    UnitPrice,
    TaxRate,
    Total,
}
