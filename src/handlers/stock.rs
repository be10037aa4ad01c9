use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, decode_file_content, no_content_response, page_response, success_response,
    validate_input,
};
use crate::services::stock::{MovementFilter, ProviderInput, RecordMovementInput};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use validator::Validate;

pub fn providers_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_providers).post(create_provider))
        .route(
            "/:id",
            get(get_provider).put(update_provider).delete(archive_provider),
        )
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(list_movements).post(record_movement))
        .route("/movements/:id", get(get_movement))
        .route(
            "/movements/:id/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route("/reasons", get(list_reasons).post(create_reason))
}

// ---- providers ----------------------------------------------------------

async fn list_providers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.stock.list_providers(&params).await?;
    Ok(page_response(page))
}

async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let provider = state.services.stock.get_provider(id).await?;
    Ok(success_response(provider))
}

async fn create_provider(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<ProviderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::ValidationError("name cannot be blank".into()));
    }
    let provider = state.services.stock.create_provider(input).await?;
    Ok(created_response(provider))
}

async fn update_provider(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(input): axum::Json<ProviderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let provider = state.services.stock.update_provider(id, input).await?;
    Ok(success_response(provider))
}

async fn archive_provider(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.stock.archive_provider(id).await?;
    Ok(no_content_response())
}

// ---- movements ----------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/stock/movements",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated movement ledger"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Stock"
)]
pub(crate) async fn list_movements(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.stock.list_movements(&params, filter).await?;
    Ok(page_response(page))
}

async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.services.stock.get_movement(id).await?;
    Ok(success_response(movement))
}

/// Record a movement; the product's stock quantity moves with it.
#[utoipa::path(
    post,
    path = "/api/v1/stock/movements",
    responses(
        (status = 201, description = "Movement recorded"),
        (status = 422, description = "Movement would drive stock negative")
    ),
    security(("Bearer" = [])),
    tag = "Stock"
)]
pub(crate) async fn record_movement(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(mut input): axum::Json<RecordMovementInput>,
) -> Result<impl IntoResponse, ServiceError> {
    input.created_by = Some(user.user_id);
    let movement = state.services.stock.record_movement(input).await?;
    Ok(created_response(movement))
}

// ---- attachments --------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
struct UploadAttachmentRequest {
    #[validate(length(min = 1, max = 255))]
    file_name: String,
    content_base64: String,
    mime_type: Option<String>,
}

async fn add_attachment(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UploadAttachmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let bytes = decode_file_content(&payload.content_base64)?;
    let key = state
        .services
        .storage
        .put("stock/attachments", &payload.file_name, &bytes)
        .await?;
    let attachment = state
        .services
        .stock
        .add_attachment(id, key, payload.file_name, payload.mime_type)
        .await?;
    Ok(created_response(attachment))
}

async fn list_attachments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let attachments = state.services.stock.list_attachments(id).await?;
    Ok(success_response(attachments))
}

// ---- reasons ------------------------------------------------------------

async fn list_reasons(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let reasons = state.services.stock.list_reasons().await?;
    Ok(success_response(reasons))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateReasonRequest {
    #[validate(length(min = 1, max = 128))]
    name: String,
    description: Option<String>,
}

async fn create_reason(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateReasonRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let reason = state
        .services
        .stock
        .create_reason(payload.name, payload.description)
        .await?;
    Ok(created_response(reason))
}
