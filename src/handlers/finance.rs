use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::finance::{CreateTransactionInput, TransactionFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn finance_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/:id/pay", post(mark_paid))
        .route("/transactions/:id/cancel", post(cancel_transaction))
        .route(
            "/transactions/:id/reminders",
            get(list_reminders).post(add_reminder),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/finance/transactions",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated transaction list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Finance"
)]
pub(crate) async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.finance.list(&params, filter).await?;
    Ok(page_response(page))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.services.finance.get(id).await?;
    Ok(success_response(transaction))
}

async fn create_transaction(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateTransactionInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.services.finance.create(input).await?;
    Ok(created_response(transaction))
}

async fn mark_paid(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.services.finance.mark_paid(id).await?;
    Ok(success_response(transaction))
}

async fn cancel_transaction(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.services.finance.cancel(id).await?;
    Ok(success_response(transaction))
}

#[derive(Debug, Deserialize)]
struct ReminderRequest {
    remind_at: DateTime<Utc>,
    note: Option<String>,
}

async fn add_reminder(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<ReminderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let reminder = state
        .services
        .finance
        .add_reminder(id, payload.remind_at, payload.note)
        .await?;
    Ok(created_response(reminder))
}

async fn list_reminders(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let reminders = state.services.finance.list_reminders(id).await?;
    Ok(success_response(reminders))
}
