//! Back-office API library
//!
//! HTTP layer, services and persistence for the back-office and its public
//! storefront.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod storage;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;
pub use crate::handlers::common::ApiResponse;
pub use crate::handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

/// The `/api/v1` back-office surface, permission-gated per route group.
pub fn api_v1_routes() -> Router<AppState> {
    let catalog_read = Router::new()
        .nest("/products", handlers::catalog::products_routes())
        .nest("/brands", handlers::catalog::brands_routes())
        .nest("/categories", handlers::catalog::categories_routes())
        .with_permission(perm::CATALOG_READ);

    let promotions = Router::new()
        .nest("/promotions", handlers::promotions::promotions_routes())
        .with_permission(perm::CATALOG_MANAGE);

    let clients = Router::new()
        .nest("/clients", handlers::clients::clients_routes())
        .with_permission(perm::CLIENTS_READ);

    let orders = Router::new()
        .nest("/orders", handlers::orders::orders_routes())
        .with_permission(perm::ORDERS_READ);

    let quotes = Router::new()
        .nest("/quotes", handlers::quotes::quotes_routes())
        .with_permission(perm::QUOTES_READ);

    let invoices = Router::new()
        .nest("/invoices", handlers::invoices::invoices_routes())
        .with_permission(perm::INVOICES_READ);

    let currencies_tax = Router::new()
        .nest("/currencies", currencies_routes())
        .nest("/tax-rates", tax_rates_routes())
        .with_permission(perm::INVOICES_READ);

    let stock = Router::new()
        .nest("/providers", handlers::stock::providers_routes())
        .nest("/stock", handlers::stock::stock_routes())
        .with_permission(perm::STOCK_READ);

    let hr = Router::new()
        .nest("/departments", handlers::hr::departments_routes())
        .nest("/employees", handlers::hr::employees_routes())
        .nest("/holidays", handlers::hr::holidays_routes())
        .nest("/leave-types", handlers::hr::leave_types_routes())
        .nest("/leave-balances", handlers::hr::leave_balances_routes())
        .with_permission(perm::HR_READ);

    let leave = Router::new()
        .nest("/leave-requests", handlers::leave::leave_requests_routes())
        .with_permission(perm::LEAVE_READ);

    let tickets = Router::new()
        .nest("/tickets", handlers::tickets::tickets_routes())
        .nest("/helpdesk", handlers::tickets::ticket_admin_routes())
        .with_permission(perm::TICKETS_READ);

    let content = Router::new()
        .nest("/blog", handlers::content::blog_routes())
        .nest("/reviews", handlers::content::reviews_routes())
        .with_permission(perm::CONTENT_READ);

    let finance = Router::new()
        .nest("/finance", handlers::finance::finance_routes())
        .with_permission(perm::FINANCE_READ);

    let web_orders = Router::new()
        .nest("/web-orders", web_orders_admin_routes())
        .with_permission(perm::ORDERS_READ);

    let users = Router::new()
        .nest("/users", handlers::users::users_routes())
        .with_permission(perm::USERS_MANAGE);

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(catalog_read)
        .merge(promotions)
        .merge(clients)
        .merge(orders)
        .merge(quotes)
        .merge(invoices)
        .merge(currencies_tax)
        .merge(stock)
        .merge(hr)
        .merge(leave)
        .merge(tickets)
        .merge(content)
        .merge(finance)
        .merge(web_orders)
        .merge(users)
}

/// The public storefront surface.
pub fn store_routes() -> Router<AppState> {
    handlers::storefront::storefront_routes()
}

// Currencies and tax rates are small enough to keep here, next to the router.

fn currencies_routes() -> Router<AppState> {
    use crate::entities::commerce::currency;
    use crate::errors::ServiceError;
    use crate::handlers::common::{created_response, success_response};
    use axum::extract::Path;
    use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

    async fn list(State(state): State<AppState>) -> Result<axum::response::Response, ServiceError> {
        let currencies = currency::Entity::find()
            .order_by_asc(currency::Column::Code)
            .all(&*state.db)
            .await?;
        Ok(success_response(currencies))
    }

    async fn show(
        State(state): State<AppState>,
        Path(id): Path<i64>,
    ) -> Result<axum::response::Response, ServiceError> {
        let found = currency::Entity::find_by_id(id)
            .one(&*state.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Currency {id} not found")))?;
        Ok(success_response(found))
    }

    #[derive(serde::Deserialize)]
    struct CurrencyRequest {
        code: String,
        name: String,
        symbol: String,
        decimal_places: Option<i32>,
        is_default: Option<bool>,
    }

    async fn create(
        _user: crate::auth::AuthenticatedUser,
        State(state): State<AppState>,
        Json(payload): Json<CurrencyRequest>,
    ) -> Result<axum::response::Response, ServiceError> {
        let code = payload.code.trim().to_ascii_uppercase();
        if code.len() != 3 {
            return Err(ServiceError::ValidationError(
                "currency code must be 3 letters".into(),
            ));
        }
        let created = currency::ActiveModel {
            code: Set(code),
            name: Set(payload.name),
            symbol: Set(payload.symbol),
            decimal_places: Set(payload.decimal_places.unwrap_or(2)),
            is_default: Set(payload.is_default.unwrap_or(false)),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*state.db)
        .await?;
        Ok(created_response(created))
    }

    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show))
}

fn tax_rates_routes() -> Router<AppState> {
    use crate::entities::commerce::tax_rate;
    use crate::errors::ServiceError;
    use crate::handlers::common::{created_response, success_response};
    use axum::extract::Path;
    use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

    async fn list(State(state): State<AppState>) -> Result<axum::response::Response, ServiceError> {
        let rates = tax_rate::Entity::find()
            .order_by_asc(tax_rate::Column::Rate)
            .all(&*state.db)
            .await?;
        Ok(success_response(rates))
    }

    async fn show(
        State(state): State<AppState>,
        Path(id): Path<i64>,
    ) -> Result<axum::response::Response, ServiceError> {
        let found = tax_rate::Entity::find_by_id(id)
            .one(&*state.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tax rate {id} not found")))?;
        Ok(success_response(found))
    }

    #[derive(serde::Deserialize)]
    struct TaxRateRequest {
        name: String,
        rate: rust_decimal::Decimal,
        is_default: Option<bool>,
    }

    async fn create(
        _user: crate::auth::AuthenticatedUser,
        State(state): State<AppState>,
        Json(payload): Json<TaxRateRequest>,
    ) -> Result<axum::response::Response, ServiceError> {
        if payload.rate < rust_decimal::Decimal::ZERO {
            return Err(ServiceError::ValidationError("rate cannot be negative".into()));
        }
        let created = tax_rate::ActiveModel {
            name: Set(payload.name),
            rate: Set(payload.rate),
            is_default: Set(payload.is_default.unwrap_or(false)),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*state.db)
        .await?;
        Ok(created_response(created))
    }

    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show))
}

fn web_orders_admin_routes() -> Router<AppState> {
    use crate::db::list_query::ListParams;
    use crate::errors::ServiceError;
    use crate::handlers::common::{page_response, success_response};
    use crate::services::web_orders::WebOrderStatus;
    use axum::extract::{Path, Query};
    use uuid::Uuid;

    #[derive(serde::Deserialize)]
    struct WebOrderListFilter {
        status: Option<WebOrderStatus>,
    }

    async fn list(
        State(state): State<AppState>,
        Query(params): Query<ListParams>,
        Query(filter): Query<WebOrderListFilter>,
    ) -> Result<axum::response::Response, ServiceError> {
        let page = state.services.web_orders.list(&params, filter.status).await?;
        Ok(page_response(page))
    }

    async fn show(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<axum::response::Response, ServiceError> {
        let order = state.services.web_orders.get(id).await?;
        let history = state.services.web_orders.history(id).await?;
        Ok(success_response(json!({
            "order": order,
            "history": history,
        })))
    }

    #[derive(serde::Deserialize)]
    struct StatusRequest {
        status: WebOrderStatus,
        comment: Option<String>,
    }

    async fn change_status(
        _user: crate::auth::AuthenticatedUser,
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
        Json(payload): Json<StatusRequest>,
    ) -> Result<axum::response::Response, ServiceError> {
        let order = state
            .services
            .web_orders
            .change_status(id, payload.status, payload.comment)
            .await?;
        Ok(success_response(order))
    }

    Router::new()
        .route("/", get(list))
        .route("/:id", get(show))
        .route("/:id/status", axum::routing::put(change_status))
}

async fn api_status() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "service": "backoffice-api",
            "version": version,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "success": db_status == "healthy",
        "data": {
            "status": db_status,
            "checks": { "database": db_status },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    }))
}
