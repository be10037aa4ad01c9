pub use sea_orm_migration::prelude::*;

mod m20240115_000001_create_users_table;
mod m20240115_000002_create_catalog_tables;
mod m20240115_000003_create_commerce_tables;
mod m20240116_000004_create_stock_tables;
mod m20240120_000005_create_hr_tables;
mod m20240120_000006_add_department_head;
mod m20240121_000007_create_leave_tables;
mod m20240205_000008_create_client_support_tickets;
mod m20240301_000009_create_content_tables;
mod m20240315_000010_create_finance_tables;
mod m20240420_000011_create_web_shop_tables;
mod m20240610_000012_rework_ticketing;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_users_table::Migration),
            Box::new(m20240115_000002_create_catalog_tables::Migration),
            Box::new(m20240115_000003_create_commerce_tables::Migration),
            Box::new(m20240116_000004_create_stock_tables::Migration),
            Box::new(m20240120_000005_create_hr_tables::Migration),
            Box::new(m20240120_000006_add_department_head::Migration),
            Box::new(m20240121_000007_create_leave_tables::Migration),
            Box::new(m20240205_000008_create_client_support_tickets::Migration),
            Box::new(m20240301_000009_create_content_tables::Migration),
            Box::new(m20240315_000010_create_finance_tables::Migration),
            Box::new(m20240420_000011_create_web_shop_tables::Migration),
            Box::new(m20240610_000012_rework_ticketing::Migration),
        ]
    }
}
