//! Business logic, one service per domain aggregate. Handlers stay thin;
//! services own queries, transactions and event emission.

pub mod catalog;
pub mod clients;
pub mod content;
pub mod finance;
pub mod helpdesk;
pub mod hr;
pub mod invoices;
pub mod leave;
pub mod orders;
pub mod promotions;
pub mod stock;
pub mod users;
pub mod web_orders;
pub mod quotes;
