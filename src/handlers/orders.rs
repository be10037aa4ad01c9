use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::orders::{
    CreateOrderInput, OrderFilter, OrderStatus, ORDER_DEFAULT_INCLUDES, ORDER_INCLUDES,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Deserialize;

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order))
        .route("/:id/items", get(get_order_items))
        .route("/:id/status", put(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated order list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub(crate) async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let includes = params.includes(ORDER_INCLUDES, ORDER_DEFAULT_INCLUDES);
    let page = state.services.orders.list(&params, filter).await?;

    let mut items = Vec::with_capacity(page.items.len());
    for order in &page.items {
        items.push(order_payload(&state, order, &includes).await?);
    }
    Ok(page_response(crate::db::list_query::Page {
        items,
        meta: page.meta,
    }))
}

async fn order_payload(
    state: &AppState,
    order: &crate::entities::commerce::order::Model,
    includes: &[String],
) -> Result<serde_json::Value, ServiceError> {
    let mut payload =
        serde_json::to_value(order).map_err(|e| ServiceError::InternalError(e.to_string()))?;
    let object = payload
        .as_object_mut()
        .ok_or_else(|| ServiceError::InternalError("order did not serialize to an object".into()))?;

    // Legacy front-end alias for order_number.
    object.insert("reference".into(), serde_json::json!(order.order_number));

    for include in includes {
        match include.as_str() {
            "items" => {
                let items = state.services.orders.get_items(order.id).await?;
                object.insert("items".into(), serde_json::to_value(items).unwrap_or_default());
            }
            "client" => {
                let client = state.services.clients.get(order.client_id).await?;
                object.insert("client".into(), serde_json::to_value(client).unwrap_or_default());
            }
            _ => {}
        }
    }
    Ok(payload)
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail"),
        (status = 404, description = "Unknown order")
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub(crate) async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let includes = params.includes(ORDER_INCLUDES, ORDER_INCLUDES);
    let order = state.services.orders.get(id).await?;
    let payload = order_payload(&state, &order, &includes).await?;
    Ok(success_response(payload))
}

async fn get_order_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.orders.get_items(id).await?;
    Ok(success_response(items))
}

async fn create_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create(input).await?;
    Ok(created_response(order))
}

#[derive(Debug, Deserialize)]
struct UpdateOrderRequest {
    notes: Option<String>,
}

async fn update_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.update_notes(id, payload.notes).await?;
    Ok(success_response(order))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

async fn update_order_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.change_status(id, payload.status).await?;
    Ok(success_response(order))
}
