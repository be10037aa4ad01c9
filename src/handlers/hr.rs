use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, page_response, success_response, validate_input,
};
use crate::services::hr::EmployeeInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

pub fn departments_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/:id",
            get(get_department).put(update_department).delete(delete_department),
        )
        .route("/:id/head", put(set_department_head))
}

pub fn employees_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(archive_employee),
        )
}

pub fn holidays_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_holidays).post(create_holiday))
        .route("/:id", delete(delete_holiday))
}

pub fn leave_types_routes() -> Router<AppState> {
    Router::new().route("/", get(list_leave_types).post(create_leave_type))
}

pub fn leave_balances_routes() -> Router<AppState> {
    Router::new().route("/", get(list_balances).put(set_balance))
}

// ---- departments --------------------------------------------------------

async fn list_departments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.hr.list_departments(&params).await?;
    Ok(page_response(page))
}

async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let department = state.services.hr.get_department(id).await?;
    Ok(success_response(department))
}

#[derive(Debug, Deserialize, Validate)]
struct DepartmentRequest {
    #[validate(length(min = 1, max = 128))]
    name: String,
    description: Option<String>,
}

async fn create_department(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<DepartmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let department = state
        .services
        .hr
        .create_department(payload.name, payload.description)
        .await?;
    Ok(created_response(department))
}

async fn update_department(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<DepartmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let department = state
        .services
        .hr
        .update_department(id, Some(payload.name), payload.description)
        .await?;
    Ok(success_response(department))
}

#[derive(Debug, Deserialize)]
struct SetHeadRequest {
    head_employee_id: Option<i64>,
}

async fn set_department_head(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<SetHeadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let department = state
        .services
        .hr
        .set_department_head(id, payload.head_employee_id)
        .await?;
    Ok(success_response(department))
}

async fn delete_department(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.hr.delete_department(id).await?;
    Ok(no_content_response())
}

// ---- employees ----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EmployeeListFilter {
    department_id: Option<i64>,
    is_active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated employee list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "HR"
)]
pub(crate) async fn list_employees(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<EmployeeListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .hr
        .list_employees(&params, filter.department_id, filter.is_active)
        .await?;
    Ok(page_response(page))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let employee = state.services.hr.get_employee(id).await?;
    Ok(success_response(employee))
}

async fn create_employee(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<EmployeeInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "first and last name are required".into(),
        ));
    }
    let employee = state.services.hr.create_employee(input).await?;
    Ok(created_response(employee))
}

async fn update_employee(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    axum::Json(input): axum::Json<EmployeeInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let employee = state.services.hr.update_employee(id, input).await?;
    Ok(success_response(employee))
}

async fn archive_employee(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.hr.archive_employee(id).await?;
    Ok(no_content_response())
}

// ---- holidays -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HolidayListFilter {
    year: Option<i32>,
}

async fn list_holidays(
    State(state): State<AppState>,
    Query(filter): Query<HolidayListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let holidays = state.services.hr.list_holidays(filter.year).await?;
    Ok(success_response(holidays))
}

#[derive(Debug, Deserialize, Validate)]
struct HolidayRequest {
    #[validate(length(min = 1, max = 128))]
    name: String,
    date: NaiveDate,
}

async fn create_holiday(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<HolidayRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let holiday = state
        .services
        .hr
        .create_holiday(payload.name, payload.date)
        .await?;
    Ok(created_response(holiday))
}

async fn delete_holiday(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.hr.delete_holiday(id).await?;
    Ok(no_content_response())
}

// ---- leave types and balances ------------------------------------------

async fn list_leave_types(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let types = state.services.hr.list_leave_types().await?;
    Ok(success_response(types))
}

#[derive(Debug, Deserialize, Validate)]
struct LeaveTypeRequest {
    #[validate(length(min = 1, max = 128))]
    name: String,
    default_days_per_year: i32,
    #[serde(default = "default_true")]
    is_paid: bool,
}

fn default_true() -> bool {
    true
}

async fn create_leave_type(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LeaveTypeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    if payload.default_days_per_year < 0 {
        return Err(ServiceError::ValidationError(
            "default_days_per_year cannot be negative".into(),
        ));
    }
    let leave_type = state
        .services
        .hr
        .create_leave_type(payload.name, payload.default_days_per_year, payload.is_paid)
        .await?;
    Ok(created_response(leave_type))
}

#[derive(Debug, Deserialize)]
struct BalanceListFilter {
    employee_id: Option<i64>,
    year: Option<i32>,
}

async fn list_balances(
    State(state): State<AppState>,
    Query(filter): Query<BalanceListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let balances = state
        .services
        .hr
        .list_balances(filter.employee_id, filter.year)
        .await?;
    Ok(success_response(balances))
}

#[derive(Debug, Deserialize)]
struct SetBalanceRequest {
    employee_id: i64,
    leave_type_id: i64,
    year: i32,
    allocated_days: Decimal,
}

async fn set_balance(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<SetBalanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if payload.allocated_days < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "allocated_days cannot be negative".into(),
        ));
    }
    let balance = state
        .services
        .hr
        .set_balance(
            payload.employee_id,
            payload.leave_type_id,
            payload.year,
            payload.allocated_days,
        )
        .await?;
    Ok(success_response(balance))
}
