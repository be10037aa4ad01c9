use sea_orm_migration::prelude::*;

use super::m20240115_000003_create_commerce_tables::{Clients, Invoices};
use super::m20240116_000004_create_stock_tables::Providers;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240315_000010_create_finance_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinancialTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Label)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Direction)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Status)
                            .string_len(32)
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Amount)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::InvoiceId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::ClientId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::ProviderId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(FinancialTransactions::DueAt).timestamp().null())
                    .col(ColumnDef::new(FinancialTransactions::PaidAt).timestamp().null())
                    .col(ColumnDef::new(FinancialTransactions::Notes).text().null())
                    .col(
                        ColumnDef::new(FinancialTransactions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactions::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transactions_invoice")
                            .from(
                                FinancialTransactions::Table,
                                FinancialTransactions::InvoiceId,
                            )
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transactions_client")
                            .from(
                                FinancialTransactions::Table,
                                FinancialTransactions::ClientId,
                            )
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transactions_provider")
                            .from(
                                FinancialTransactions::Table,
                                FinancialTransactions::ProviderId,
                            )
                            .to(Providers::Table, Providers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_financial_transactions_status_due")
                    .table(FinancialTransactions::Table)
                    .col(FinancialTransactions::Status)
                    .col(FinancialTransactions::DueAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinancialTransactionReminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialTransactionReminders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactionReminders::TransactionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactionReminders::RemindAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialTransactionReminders::SentAt)
                            .timestamp()
                            .null(),
                    )
                    .col(ColumnDef::new(FinancialTransactionReminders::Note).text().null())
                    .col(
                        ColumnDef::new(FinancialTransactionReminders::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_transaction_reminders_transaction")
                            .from(
                                FinancialTransactionReminders::Table,
                                FinancialTransactionReminders::TransactionId,
                            )
                            .to(FinancialTransactions::Table, FinancialTransactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(FinancialTransactionReminders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FinancialTransactions {
    Table,
    Id,
    Label,
    Direction,
    Status,
    Amount,
    Currency,
    InvoiceId,
    ClientId,
    ProviderId,
    DueAt,
    PaidAt,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum FinancialTransactionReminders {
    Table,
    Id,
    TransactionId,
    RemindAt,
    SentAt,
    Note,
    CreatedAt,
}
