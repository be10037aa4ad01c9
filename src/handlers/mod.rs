pub mod catalog;
pub mod clients;
pub mod common;
pub mod content;
pub mod finance;
pub mod hr;
pub mod invoices;
pub mod leave;
pub mod orders;
pub mod promotions;
pub mod quotes;
pub mod stock;
pub mod storefront;
pub mod tickets;
pub mod users;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::storage::Storage;
use std::sync::Arc;

pub use crate::AppState;

/// Service container shared by all HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub promotions: Arc<crate::services::promotions::PromotionService>,
    pub clients: Arc<crate::services::clients::ClientService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub quotes: Arc<crate::services::quotes::QuoteService>,
    pub invoices: Arc<crate::services::invoices::InvoiceService>,
    pub stock: Arc<crate::services::stock::StockService>,
    pub hr: Arc<crate::services::hr::HrService>,
    pub leave: Arc<crate::services::leave::LeaveService>,
    pub helpdesk: Arc<crate::services::helpdesk::HelpdeskService>,
    pub content: Arc<crate::services::content::ContentService>,
    pub finance: Arc<crate::services::finance::FinanceService>,
    pub web_orders: Arc<crate::services::web_orders::WebOrderService>,
    pub users: Arc<crate::services::users::UserService>,
    pub storage: Arc<Storage>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, storage: Arc<Storage>) -> Self {
        let catalog = Arc::new(crate::services::catalog::CatalogService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let promotions = Arc::new(crate::services::promotions::PromotionService::new(db.clone()));
        let clients = Arc::new(crate::services::clients::ClientService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let quotes = Arc::new(crate::services::quotes::QuoteService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let invoices = Arc::new(crate::services::invoices::InvoiceService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let stock = Arc::new(crate::services::stock::StockService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let hr_service = crate::services::hr::HrService::new(db.clone());
        let hr = Arc::new(hr_service.clone());
        let leave = Arc::new(crate::services::leave::LeaveService::new(
            db.clone(),
            hr_service,
            event_sender.clone(),
        ));
        let helpdesk = Arc::new(crate::services::helpdesk::HelpdeskService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let content = Arc::new(crate::services::content::ContentService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let finance = Arc::new(crate::services::finance::FinanceService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let web_orders = Arc::new(crate::services::web_orders::WebOrderService::new(
            db.clone(),
            promotions.as_ref().clone(),
            event_sender.clone(),
        ));
        let users = Arc::new(crate::services::users::UserService::new(db));

        Self {
            catalog,
            promotions,
            clients,
            orders,
            quotes,
            invoices,
            stock,
            hr,
            leave,
            helpdesk,
            content,
            finance,
            web_orders,
            users,
            storage,
        }
    }
}
