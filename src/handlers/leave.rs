use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, page_response, success_response};
use crate::services::leave::{LeaveFilter, SubmitLeaveInput};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

pub fn leave_requests_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(submit_request))
        .route("/:id", get(get_request))
        .route("/:id/actions", get(list_actions))
        .route("/:id/manager-approve", post(manager_approve))
        .route("/:id/manager-reject", post(manager_reject))
        .route("/:id/hr-approve", post(hr_approve))
        .route("/:id/hr-reject", post(hr_reject))
        .route("/:id/cancel", post(cancel_request))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<LeaveFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.leave.list(&params, filter).await?;
    Ok(page_response(page))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state.services.leave.get(id).await?;
    Ok(success_response(request))
}

async fn list_actions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let actions = state.services.leave.actions(id).await?;
    Ok(success_response(actions))
}

/// Submit a leave request; it opens at pending_manager.
#[utoipa::path(
    post,
    path = "/api/v1/leave-requests",
    responses(
        (status = 201, description = "Request submitted"),
        (status = 422, description = "No working days or insufficient balance")
    ),
    security(("Bearer" = [])),
    tag = "Leave"
)]
pub(crate) async fn submit_request(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<SubmitLeaveInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state.services.leave.submit(input).await?;
    Ok(created_response(request))
}

#[derive(Debug, Deserialize)]
struct DecisionRequest {
    /// Employee id of the acting manager / HR member.
    actor_employee_id: i64,
    comment: Option<String>,
}

async fn manager_approve(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DecisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .leave
        .manager_decide(id, payload.actor_employee_id, true, payload.comment)
        .await?;
    Ok(success_response(request))
}

async fn manager_reject(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DecisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .leave
        .manager_decide(id, payload.actor_employee_id, false, payload.comment)
        .await?;
    Ok(success_response(request))
}

async fn hr_approve(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DecisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .leave
        .hr_decide(id, payload.actor_employee_id, true, payload.comment)
        .await?;
    Ok(success_response(request))
}

async fn hr_reject(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DecisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .leave
        .hr_decide(id, payload.actor_employee_id, false, payload.comment)
        .await?;
    Ok(success_response(request))
}

async fn cancel_request(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DecisionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .leave
        .cancel(id, payload.actor_employee_id, payload.comment)
        .await?;
    Ok(success_response(request))
}
