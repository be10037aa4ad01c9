use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, page_response, success_response,
};
use crate::services::clients::ClientInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn clients_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(archive_client),
        )
}

#[derive(Debug, Deserialize)]
struct ClientListFilter {
    is_active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated client list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Clients"
)]
pub(crate) async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<ClientListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.clients.list(&params, filter.is_active).await?;
    Ok(page_response(page))
}

async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.services.clients.get(id).await?;
    Ok(success_response(client))
}

async fn create_client(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<ClientInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::ValidationError("name cannot be blank".into()));
    }
    let client = state.services.clients.create(input).await?;
    Ok(created_response(client))
}

async fn update_client(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(input): axum::Json<ClientInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let client = state.services.clients.update(id, input).await?;
    Ok(success_response(client))
}

async fn archive_client(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.clients.archive(id).await?;
    Ok(no_content_response())
}
