use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::promotions::CreatePromotionInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

pub fn promotions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promotions).post(create_promotion))
        .route("/:id", get(get_promotion))
        .route("/:id/deactivate", post(deactivate_promotion))
        .route("/:id/codes", get(list_codes).post(add_code))
}

async fn list_promotions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.promotions.list(&params).await?;
    Ok(page_response(page))
}

async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let promotion = state.services.promotions.get(id).await?;
    Ok(success_response(promotion))
}

async fn create_promotion(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreatePromotionInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let promotion = state.services.promotions.create(input).await?;
    Ok(created_response(promotion))
}

async fn deactivate_promotion(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let promotion = state.services.promotions.deactivate(id).await?;
    Ok(success_response(promotion))
}

#[derive(Debug, Deserialize)]
struct AddCodeRequest {
    code: String,
    max_uses: Option<i32>,
}

async fn add_code(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<AddCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let code = state
        .services
        .promotions
        .add_code(id, payload.code, payload.max_uses)
        .await?;
    Ok(created_response(code))
}

async fn list_codes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let codes = state.services.promotions.list_codes(id).await?;
    Ok(success_response(codes))
}
