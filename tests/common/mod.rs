//! Shared test harness: an in-memory SQLite database with the full
//! migration history applied, plus the service stack wired the same way
//! `main` does it.

use backoffice_api::services::catalog::{CatalogService, CreateProductInput};
use backoffice_api::services::clients::{ClientInput, ClientService};
use backoffice_api::services::content::ContentService;
use backoffice_api::services::finance::FinanceService;
use backoffice_api::services::helpdesk::HelpdeskService;
use backoffice_api::services::hr::HrService;
use backoffice_api::services::invoices::InvoiceService;
use backoffice_api::services::leave::LeaveService;
use backoffice_api::services::orders::OrderService;
use backoffice_api::services::promotions::PromotionService;
use backoffice_api::services::quotes::QuoteService;
use backoffice_api::services::stock::StockService;
use backoffice_api::services::web_orders::WebOrderService;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;

pub struct TestCtx {
    pub db: Arc<DatabaseConnection>,
    pub catalog: CatalogService,
    pub promotions: PromotionService,
    pub clients: ClientService,
    pub orders: OrderService,
    pub quotes: QuoteService,
    pub invoices: InvoiceService,
    pub stock: StockService,
    pub hr: HrService,
    pub leave: LeaveService,
    pub helpdesk: HelpdeskService,
    pub content: ContentService,
    pub finance: FinanceService,
    pub web_orders: WebOrderService,
    // Keep the receiver alive so event sends stay cheap no-ops.
    _events: Receiver<backoffice_api::events::Event>,
}

pub async fn setup() -> TestCtx {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("sqlite in-memory connection");
    backoffice_migrations::Migrator::up(&db, None)
        .await
        .expect("migrations apply cleanly");

    let db = Arc::new(db);
    let (event_sender, events) = backoffice_api::events::channel(256);
    let event_sender = Arc::new(event_sender);

    let hr = HrService::new(db.clone());
    let promotions = PromotionService::new(db.clone());

    TestCtx {
        catalog: CatalogService::new(db.clone(), event_sender.clone()),
        promotions: promotions.clone(),
        clients: ClientService::new(db.clone(), event_sender.clone()),
        orders: OrderService::new(db.clone(), event_sender.clone()),
        quotes: QuoteService::new(db.clone(), event_sender.clone()),
        invoices: InvoiceService::new(db.clone(), event_sender.clone()),
        stock: StockService::new(db.clone(), event_sender.clone()),
        hr: hr.clone(),
        leave: LeaveService::new(db.clone(), hr, event_sender.clone()),
        helpdesk: HelpdeskService::new(db.clone(), event_sender.clone()),
        content: ContentService::new(db.clone(), event_sender.clone()),
        finance: FinanceService::new(db.clone(), event_sender.clone()),
        web_orders: WebOrderService::new(db.clone(), promotions, event_sender),
        db,
        _events: events,
    }
}

/// Insert a product with sane defaults.
#[allow(dead_code)]
pub async fn seed_product(
    ctx: &TestCtx,
    sku: &str,
    name: &str,
    price: Decimal,
) -> backoffice_api::entities::catalog::product::Model {
    ctx.catalog
        .create_product(CreateProductInput {
            sku: sku.to_string(),
            name: name.to_string(),
            description: None,
            brand_id: None,
            category_id: None,
            tax_rate_id: None,
            price,
            currency: "EUR".to_string(),
            stock_quantity: Some(0),
            is_active: Some(true),
        })
        .await
        .expect("product created")
}

/// Insert a client with sane defaults.
#[allow(dead_code)]
pub async fn seed_client(
    ctx: &TestCtx,
    name: &str,
) -> backoffice_api::entities::commerce::client::Model {
    ctx.clients
        .create(ClientInput {
            name: name.to_string(),
            email: Some(format!(
                "{}@example.com",
                name.to_ascii_lowercase().replace(' ', ".")
            )),
            phone: None,
            vat_number: None,
            street: None,
            city: None,
            postal_code: None,
            country: None,
            notes: None,
            is_active: None,
        })
        .await
        .expect("client created")
}
