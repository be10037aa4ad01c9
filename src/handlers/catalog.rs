use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, decode_file_content, no_content_response, page_response, success_response,
    validate_input,
};
use crate::services::catalog::{
    CreateCategoryInput, CreateProductInput, CreateVariantInput, ProductFilter,
    UpdateCategoryInput, UpdateProductInput, PRODUCT_DEFAULT_INCLUDES, PRODUCT_INCLUDES,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(archive_product))
        .route("/:id/price-history", get(list_price_history))
        .route("/:id/variants", get(list_variants).post(create_variant))
        .route("/:id/images", get(list_images).post(add_image))
        .route("/:id/documents", get(list_documents).post(add_document))
        .route("/variants/:variant_id", get(get_variant).delete(delete_variant))
        .route("/variants/:variant_id/price", put(update_variant_price))
        .route("/images/:image_id", delete(delete_image))
}

pub fn brands_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/:id", get(get_brand).put(update_brand).delete(delete_brand))
}

pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/tree", get(category_tree))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

// ---- products -----------------------------------------------------------

/// List products with search, filters, sorting and validated includes.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated product list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Catalog"
)]
pub(crate) async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let includes = params.includes(PRODUCT_INCLUDES, PRODUCT_DEFAULT_INCLUDES);
    let page = state.services.catalog.list_products(&params, filter).await?;

    let mut items = Vec::with_capacity(page.items.len());
    for product in &page.items {
        items.push(product_payload(&state, product, &includes).await?);
    }

    Ok(page_response(crate::db::list_query::Page {
        items,
        meta: page.meta,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail"),
        (status = 404, description = "Unknown product")
    ),
    security(("Bearer" = [])),
    tag = "Catalog"
)]
pub(crate) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    // The detail view eager-loads the full relation set unless told otherwise.
    let includes = params.includes(PRODUCT_INCLUDES, PRODUCT_INCLUDES);
    let product = state.services.catalog.get_product(id).await?;
    let payload = product_payload(&state, &product, &includes).await?;
    Ok(success_response(payload))
}

/// Shape one product, attaching only the whitelisted relations asked for.
async fn product_payload(
    state: &AppState,
    product: &crate::entities::catalog::product::Model,
    includes: &[String],
) -> Result<serde_json::Value, ServiceError> {
    let mut payload = serde_json::to_value(product)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    let object = payload
        .as_object_mut()
        .ok_or_else(|| ServiceError::InternalError("product did not serialize to an object".into()))?;

    for include in includes {
        match include.as_str() {
            "variants" => {
                let variants = state.services.catalog.list_variants(product.id).await?;
                object.insert("variants".into(), serde_json::to_value(variants).unwrap_or_default());
            }
            "images" => {
                let images = state.services.catalog.list_images(product.id).await?;
                let shaped: Vec<_> = images
                    .into_iter()
                    .map(|image| {
                        let url = state.services.storage.url(&image.storage_key);
                        json!({
                            "id": image.id,
                            "url": url,
                            "alt_text": image.alt_text,
                            "position": image.position,
                            "is_primary": image.is_primary,
                        })
                    })
                    .collect();
                object.insert("images".into(), json!(shaped));
            }
            "documents" => {
                let documents = state.services.catalog.list_documents(product.id).await?;
                let shaped: Vec<_> = documents
                    .into_iter()
                    .map(|doc| {
                        let url = state.services.storage.url(&doc.storage_key);
                        json!({
                            "id": doc.id,
                            "title": doc.title,
                            "url": url,
                            "mime_type": doc.mime_type,
                        })
                    })
                    .collect();
                object.insert("documents".into(), json!(shaped));
            }
            "brand" => {
                if let Some(brand_id) = product.brand_id {
                    let brand = state.services.catalog.get_brand(brand_id).await?;
                    object.insert("brand".into(), serde_json::to_value(brand).unwrap_or_default());
                }
            }
            "category" => {
                if let Some(category_id) = product.category_id {
                    let category = state.services.catalog.get_category(category_id).await?;
                    object.insert(
                        "category".into(),
                        serde_json::to_value(category).unwrap_or_default(),
                    );
                }
            }
            _ => {}
        }
    }

    Ok(payload)
}

#[derive(Debug, Deserialize, Validate)]
struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    sku: String,
    #[validate(length(min = 1, max = 255))]
    name: String,
    description: Option<String>,
    brand_id: Option<i64>,
    category_id: Option<i64>,
    tax_rate_id: Option<i64>,
    price: Decimal,
    currency: Option<String>,
    stock_quantity: Option<i32>,
    is_active: Option<bool>,
}

async fn create_product(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    if payload.price < Decimal::ZERO {
        return Err(ServiceError::ValidationError("price cannot be negative".into()));
    }

    let currency = payload
        .currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "EUR".to_string());

    let product = state
        .services
        .catalog
        .create_product(CreateProductInput {
            sku: payload.sku.trim().to_string(),
            name: payload.name.trim().to_string(),
            description: payload.description,
            brand_id: payload.brand_id,
            category_id: payload.category_id,
            tax_rate_id: payload.tax_rate_id,
            price: payload.price,
            currency,
            stock_quantity: payload.stock_quantity,
            is_active: payload.is_active,
        })
        .await?;

    Ok(created_response(product))
}

async fn update_product(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(mut input): axum::Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    input.changed_by = Some(user.user_id);
    let product = state.services.catalog.update_product(id, input).await?;
    Ok(success_response(product))
}

async fn archive_product(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.archive_product(id).await?;
    Ok(no_content_response())
}

async fn list_price_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let history = state.services.catalog.list_price_history(id).await?;
    Ok(success_response(history))
}

// ---- variants -----------------------------------------------------------

async fn list_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let variants = state.services.catalog.list_variants(id).await?;
    Ok(success_response(variants))
}

async fn create_variant(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(input): axum::Json<CreateVariantInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = state.services.catalog.create_variant(id, input).await?;
    Ok(created_response(variant))
}

async fn get_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = state.services.catalog.get_variant(variant_id).await?;
    Ok(success_response(variant))
}

#[derive(Debug, Deserialize)]
struct UpdatePriceRequest {
    price: Decimal,
}

async fn update_variant_price(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(variant_id): Path<i64>,
    axum::Json(payload): axum::Json<UpdatePriceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = state
        .services
        .catalog
        .update_variant_price(variant_id, payload.price, Some(user.user_id))
        .await?;
    Ok(success_response(variant))
}

async fn delete_variant(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(variant_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_variant(variant_id).await?;
    Ok(no_content_response())
}

// ---- images & documents -------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
struct UploadImageRequest {
    #[validate(length(min = 1, max = 255))]
    file_name: String,
    content_base64: String,
    alt_text: Option<String>,
    #[serde(default)]
    is_primary: bool,
}

async fn add_image(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UploadImageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let bytes = decode_file_content(&payload.content_base64)?;
    let key = state
        .services
        .storage
        .put("products/images", &payload.file_name, &bytes)
        .await?;
    let image = state
        .services
        .catalog
        .add_image(id, key, payload.alt_text, payload.is_primary)
        .await?;
    Ok(created_response(image))
}

async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let images = state.services.catalog.list_images(id).await?;
    Ok(success_response(images))
}

async fn delete_image(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(image_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let image = state.services.catalog.delete_image(image_id).await?;
    state.services.storage.delete(&image.storage_key).await?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize, Validate)]
struct UploadDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    file_name: String,
    #[validate(length(min = 1, max = 255))]
    title: String,
    content_base64: String,
    mime_type: Option<String>,
}

async fn add_document(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UploadDocumentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let bytes = decode_file_content(&payload.content_base64)?;
    let key = state
        .services
        .storage
        .put("products/documents", &payload.file_name, &bytes)
        .await?;
    let document = state
        .services
        .catalog
        .add_document(id, key, payload.title, payload.mime_type)
        .await?;
    Ok(created_response(document))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let documents = state.services.catalog.list_documents(id).await?;
    Ok(success_response(documents))
}

// ---- brands -------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize, Validate)]
struct BrandRequest {
    #[validate(length(min = 1, max = 255))]
    name: String,
    description: Option<String>,
    is_active: Option<bool>,
}

async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.catalog.list_brands(&params).await?;
    Ok(page_response(page))
}

async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let brand = state.services.catalog.get_brand(id).await?;
    Ok(success_response(brand))
}

async fn create_brand(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<BrandRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let brand = state
        .services
        .catalog
        .create_brand(payload.name.trim().to_string(), payload.description)
        .await?;
    Ok(created_response(brand))
}

async fn update_brand(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<BrandRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let brand = state
        .services
        .catalog
        .update_brand(id, Some(payload.name), payload.description, payload.is_active)
        .await?;
    Ok(success_response(brand))
}

async fn delete_brand(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_brand(id).await?;
    Ok(no_content_response())
}

// ---- categories ---------------------------------------------------------

async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.catalog.list_categories(&params).await?;
    Ok(page_response(page))
}

async fn category_tree(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let tree = state.services.catalog.category_tree().await?;
    Ok(success_response(tree))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(success_response(category))
}

async fn create_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.catalog.create_category(input).await?;
    Ok(created_response(category))
}

async fn update_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(input): axum::Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.catalog.update_category(id, input).await?;
    Ok(success_response(category))
}

async fn delete_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_category(id).await?;
    Ok(no_content_response())
}
