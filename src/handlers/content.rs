use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::entities::content::product_review::ReviewStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, decode_file_content, no_content_response, page_response, success_response,
    validate_input,
};
use crate::services::content::{CreatePostInput, UpdatePostInput};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/publish", post(publish_post))
        .route("/:id/unpublish", post(unpublish_post))
        .route("/:id/banner", put(set_banner))
}

pub fn reviews_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews))
        .route("/:id/approve", post(approve_review))
        .route("/:id/reject", post(reject_review))
}

// ---- blog ---------------------------------------------------------------

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.content.list_posts(&params, false).await?;
    Ok(page_response(page))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let post = state.services.content.get_post(id).await?;
    Ok(success_response(post))
}

async fn create_post(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(mut input): axum::Json<CreatePostInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.title.trim().is_empty() {
        return Err(ServiceError::ValidationError("title cannot be blank".into()));
    }
    input.author_user_id = Some(user.user_id);
    let post = state.services.content.create_post(input).await?;
    Ok(created_response(post))
}

async fn update_post(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(input): axum::Json<UpdatePostInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let post = state.services.content.update_post(id, input).await?;
    Ok(success_response(post))
}

async fn publish_post(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let post = state.services.content.publish_post(id).await?;
    Ok(success_response(post))
}

async fn unpublish_post(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let post = state.services.content.unpublish_post(id).await?;
    Ok(success_response(post))
}

async fn delete_post(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.content.delete_post(id).await?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize, Validate)]
struct BannerRequest {
    #[validate(length(min = 1, max = 255))]
    file_name: String,
    content_base64: String,
}

async fn set_banner(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<BannerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let bytes = decode_file_content(&payload.content_base64)?;
    let key = state
        .services
        .storage
        .put("blog/banners", &payload.file_name, &bytes)
        .await?;
    let post = state
        .services
        .content
        .update_post(
            id,
            UpdatePostInput {
                banner_key: Some(key),
                ..Default::default()
            },
        )
        .await?;
    Ok(success_response(post))
}

// ---- review moderation --------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReviewListFilter {
    product_id: Option<Uuid>,
    status: Option<ReviewStatus>,
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ReviewListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .content
        .list_reviews(&params, filter.product_id, filter.status)
        .await?;
    Ok(page_response(page))
}

async fn approve_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .content
        .moderate_review(id, true, user.user_id)
        .await?;
    Ok(success_response(review))
}

async fn reject_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .content
        .moderate_review(id, false, user.user_id)
        .await?;
    Ok(success_response(review))
}
