use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::invoices::{CreateInvoiceInput, InvoiceStatus};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn invoices_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/from-order/:order_id", post(create_from_order))
        .route("/:id", get(get_invoice))
        .route("/:id/items", get(get_invoice_items))
        .route("/:id/status", put(update_invoice_status))
}

#[derive(Debug, Deserialize)]
struct InvoiceListFilter {
    status: Option<InvoiceStatus>,
    client_id: Option<i64>,
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<InvoiceListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .invoices
        .list(&params, filter.status, filter.client_id)
        .await?;
    Ok(page_response(page))
}

async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state.services.invoices.get(id).await?;
    Ok(success_response(invoice))
}

async fn get_invoice_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.invoices.get_items(id).await?;
    Ok(success_response(items))
}

async fn create_invoice(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateInvoiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state.services.invoices.create(input).await?;
    Ok(created_response(invoice))
}

#[derive(Debug, Deserialize)]
struct FromOrderRequest {
    due_at: Option<DateTime<Utc>>,
}

async fn create_from_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    payload: Option<axum::Json<FromOrderRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let due_at = payload.and_then(|p| p.0.due_at);
    let invoice = state
        .services
        .invoices
        .create_from_order(order_id, due_at)
        .await?;
    Ok(created_response(invoice))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: InvoiceStatus,
}

async fn update_invoice_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state
        .services
        .invoices
        .change_status(id, payload.status)
        .await?;
    Ok(success_response(invoice))
}
