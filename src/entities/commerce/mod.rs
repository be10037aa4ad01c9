pub mod client;
pub mod currency;
pub mod invoice;
pub mod invoice_item;
pub mod order;
pub mod order_item;
pub mod quote;
pub mod quote_item;
pub mod tax_rate;
pub mod web_order;
pub mod web_order_status_history;
