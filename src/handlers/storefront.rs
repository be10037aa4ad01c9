//! Public storefront API: catalog browsing, the blog, reviews and guest
//! checkout with order tracking. No authentication; only active/published
//! records are exposed.

use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::catalog::ProductFilter;
use crate::services::content::SubmitReviewInput;
use crate::services::web_orders::PlaceWebOrderInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/reviews", get(list_reviews).post(submit_review))
        .route("/categories", get(category_tree))
        .route("/brands", get(list_brands))
        .route("/blog", get(list_posts))
        .route("/blog/:slug", get(get_post))
        .route("/orders", post(place_order))
        .route("/orders/:order_number/track", get(track_order))
}

// ---- catalog ------------------------------------------------------------

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(mut filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    // The storefront never sees inactive or archived products.
    filter.is_active = Some(true);
    let mut params = params;
    params.with_deleted = false;

    let page = state.services.catalog.list_products(&params, filter).await?;
    let mut items = Vec::with_capacity(page.items.len());
    for product in &page.items {
        items.push(storefront_product(&state, product).await?);
    }
    Ok(page_response(crate::db::list_query::Page {
        items,
        meta: page.meta,
    }))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;
    if !product.is_active || product.deleted_at.is_some() {
        return Err(ServiceError::NotFound(format!("Product {id} not found")));
    }
    let payload = storefront_product(&state, &product).await?;
    Ok(success_response(payload))
}

/// Public product shape: no cost/tax internals, image URLs resolved.
async fn storefront_product(
    state: &AppState,
    product: &crate::entities::catalog::product::Model,
) -> Result<serde_json::Value, ServiceError> {
    let images = state.services.catalog.list_images(product.id).await?;
    let image_urls: Vec<_> = images
        .iter()
        .map(|image| state.services.storage.url(&image.storage_key))
        .collect();
    let variants = state.services.catalog.list_variants(product.id).await?;
    let variants: Vec<_> = variants
        .into_iter()
        .filter(|v| v.is_active)
        .map(|v| {
            json!({
                "id": v.id,
                "sku": v.sku,
                "name": v.name,
                "price": v.price.unwrap_or(product.price),
                "in_stock": v.stock_quantity > 0,
            })
        })
        .collect();

    Ok(json!({
        "id": product.id,
        "sku": product.sku,
        "name": product.name,
        "description": product.description,
        "price": product.price,
        "currency": product.currency,
        "in_stock": product.stock_quantity > 0,
        "images": image_urls,
        "variants": variants,
    }))
}

async fn category_tree(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let tree = state.services.catalog.category_tree().await?;
    Ok(success_response(tree))
}

async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.catalog.list_brands(&params).await?;
    Ok(page_response(page))
}

// ---- blog ---------------------------------------------------------------

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.content.list_posts(&params, true).await?;
    Ok(page_response(page))
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let post = state.services.content.get_published_post(&slug).await?;
    Ok(success_response(post))
}

// ---- reviews ------------------------------------------------------------

async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    use crate::entities::content::product_review::ReviewStatus;
    let page = state
        .services
        .content
        .list_reviews(&params, Some(id), Some(ReviewStatus::Approved))
        .await?;
    Ok(page_response(page))
}

async fn submit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(mut input): axum::Json<SubmitReviewInput>,
) -> Result<impl IntoResponse, ServiceError> {
    input.product_id = id;
    let review = state.services.content.submit_review(input).await?;
    Ok(created_response(json!({
        "id": review.id,
        "status": review.status,
    })))
}

// ---- guest checkout and tracking ---------------------------------------

/// Place a guest order.
#[utoipa::path(
    post,
    path = "/api/store/orders",
    responses(
        (status = 201, description = "Order placed"),
        (status = 400, description = "Empty cart, unknown product or bad promotion code")
    ),
    tag = "Storefront"
)]
pub(crate) async fn place_order(
    State(state): State<AppState>,
    axum::Json(input): axum::Json<PlaceWebOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.web_orders.place(input).await?;
    Ok(created_response(json!({
        "order_number": order.order_number,
        "status": order.status,
        "subtotal": order.subtotal,
        "discount_total": order.discount_total,
        "total": order.total,
        "currency": order.currency,
    })))
}

#[derive(Debug, Deserialize)]
struct TrackQuery {
    email: String,
}

/// Track an order by number + checkout email.
#[utoipa::path(
    get,
    path = "/api/store/orders/{order_number}/track",
    params(
        ("order_number" = String, Path, description = "Order number from checkout"),
        ("email" = String, Query, description = "Email used at checkout")
    ),
    responses(
        (status = 200, description = "Order status and history"),
        (status = 404, description = "Unknown order number / email pair")
    ),
    tag = "Storefront"
)]
pub(crate) async fn track_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (order, history) = state
        .services
        .web_orders
        .track(&order_number, &query.email)
        .await?;

    let history: Vec<_> = history
        .into_iter()
        .map(|entry| {
            json!({
                "status": entry.new_status,
                "comment": entry.comment,
                "at": entry.created_at,
            })
        })
        .collect();

    Ok(success_response(json!({
        "order_number": order.order_number,
        "status": order.status,
        "total": order.total,
        "currency": order.currency,
        "items": order.items,
        "history": history,
    })))
}
