use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::quotes::{CreateQuoteInput, QuoteStatus};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

pub fn quotes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote))
        .route("/:id/items", get(get_quote_items))
        .route("/:id/status", put(update_quote_status))
        .route("/:id/convert", post(convert_quote))
}

#[derive(Debug, Deserialize)]
struct QuoteListFilter {
    status: Option<QuoteStatus>,
    client_id: Option<i64>,
}

async fn list_quotes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<QuoteListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .quotes
        .list(&params, filter.status, filter.client_id)
        .await?;
    Ok(page_response(page))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.get(id).await?;
    Ok(success_response(quote))
}

async fn get_quote_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.quotes.get_items(id).await?;
    Ok(success_response(items))
}

async fn create_quote(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateQuoteInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.create(input).await?;
    Ok(created_response(quote))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: QuoteStatus,
}

async fn update_quote_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state.services.quotes.change_status(id, payload.status).await?;
    Ok(success_response(quote))
}

/// Convert an accepted quote into a confirmed order.
#[utoipa::path(
    post,
    path = "/api/v1/quotes/{id}/convert",
    params(("id" = i64, Path, description = "Quote id")),
    responses(
        (status = 201, description = "Order created from the quote"),
        (status = 409, description = "Quote already converted"),
        (status = 422, description = "Quote is not accepted")
    ),
    security(("Bearer" = [])),
    tag = "Quotes"
)]
pub(crate) async fn convert_quote(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.quotes.convert_to_order(id).await?;
    Ok(created_response(order))
}
