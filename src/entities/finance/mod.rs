pub mod financial_transaction;
pub mod financial_transaction_reminder;
