use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::users::{CreateUserInput, UpdateUserInput};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.users.list(&params).await?;
    Ok(page_response(page))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get(id).await?;
    Ok(success_response(user))
}

async fn create_user(
    _admin: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.password.len() < 8 {
        return Err(ServiceError::ValidationError(
            "password must be at least 8 characters".into(),
        ));
    }
    let user = state.services.users.create(input).await?;
    Ok(created_response(user))
}

async fn update_user(
    _admin: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(input): axum::Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.update(id, input).await?;
    Ok(success_response(user))
}
