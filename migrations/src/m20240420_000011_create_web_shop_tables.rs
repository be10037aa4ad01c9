use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240420_000011_create_web_shop_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Promotions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Promotions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Promotions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Promotions::Description).text().null())
                    .col(
                        ColumnDef::new(Promotions::DiscountKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::DiscountValue)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Promotions::StartsAt).timestamp().not_null())
                    .col(ColumnDef::new(Promotions::EndsAt).timestamp().null())
                    .col(
                        ColumnDef::new(Promotions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Promotions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Promotions::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PromotionCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromotionCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PromotionCodes::PromotionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionCodes::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PromotionCodes::MaxUses).integer().null())
                    .col(
                        ColumnDef::new(PromotionCodes::TimesUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PromotionCodes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PromotionCodes::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promotion_codes_promotion")
                            .from(PromotionCodes::Table, PromotionCodes::PromotionId)
                            .to(Promotions::Table, Promotions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebOrders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WebOrders::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(WebOrders::OrderNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WebOrders::CustomerName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebOrders::CustomerEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebOrders::CustomerPhone)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WebOrders::ShippingAddress)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("received"),
                    )
                    .col(
                        ColumnDef::new(WebOrders::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(WebOrders::Items).json().not_null())
                    .col(ColumnDef::new(WebOrders::Subtotal).decimal_len(19, 4).not_null())
                    .col(
                        ColumnDef::new(WebOrders::DiscountTotal)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(WebOrders::Total).decimal_len(19, 4).not_null())
                    .col(
                        ColumnDef::new(WebOrders::PromotionCodeId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(WebOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(WebOrders::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(WebOrders::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_web_orders_promotion_code")
                            .from(WebOrders::Table, WebOrders::PromotionCodeId)
                            .to(PromotionCodes::Table, PromotionCodes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_web_orders_customer_email")
                    .table(WebOrders::Table)
                    .col(WebOrders::CustomerEmail)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebOrderStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebOrderStatusHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WebOrderStatusHistory::WebOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebOrderStatusHistory::OldStatus)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WebOrderStatusHistory::NewStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WebOrderStatusHistory::Comment).text().null())
                    .col(
                        ColumnDef::new(WebOrderStatusHistory::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_web_order_status_history_order")
                            .from(
                                WebOrderStatusHistory::Table,
                                WebOrderStatusHistory::WebOrderId,
                            )
                            .to(WebOrders::Table, WebOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            WebOrderStatusHistory::Table.into_iden(),
            WebOrders::Table.into_iden(),
            PromotionCodes::Table.into_iden(),
            Promotions::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Promotions {
    Table,
    Id,
    Name,
    Description,
    DiscountKind,
    DiscountValue,
    StartsAt,
    EndsAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum PromotionCodes {
    Table,
    Id,
    PromotionId,
    Code,
    MaxUses,
    TimesUsed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum WebOrders {
    Table,
    Id,
    OrderNumber,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    ShippingAddress,
    Status,
    Currency,
    Items,
    Subtotal,
    DiscountTotal,
    Total,
    PromotionCodeId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum WebOrderStatusHistory {
    Table,
    Id,
    WebOrderId,
    OldStatus,
    NewStatus,
    Comment,
    CreatedAt,
}
