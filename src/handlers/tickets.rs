use crate::auth::AuthenticatedUser;
use crate::db::list_query::ListParams;
use crate::entities::helpdesk::ticket::TicketStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, decode_file_content, no_content_response, page_response, success_response,
    validate_input,
};
use crate::services::helpdesk::{
    AddCommentInput, CreateSlaPolicyInput, CreateTicketInput, TicketFilter, TICKET_DEFAULT_INCLUDES,
    TICKET_INCLUDES,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub fn tickets_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:id", get(get_ticket))
        .route("/:id/assign", put(assign_ticket))
        .route("/:id/status", put(update_ticket_status))
        .route("/:id/comments", get(list_comments).post(add_comment))
        .route("/:id/watchers", get(list_watchers).post(add_watcher))
        .route("/:id/watchers/:employee_id", delete(remove_watcher))
        .route("/:id/tags/:tag_id", put(tag_ticket).delete(untag_ticket))
        .route("/:id/attachments", get(list_attachments).post(add_attachment))
}

pub fn ticket_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/queues", get(list_queues).post(create_queue))
        .route("/tags", get(list_tags).post(create_tag))
        .route("/sla-policies", get(list_policies).post(create_policy))
}

// ---- tickets ------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated ticket list"),
        (status = 401, description = "Unauthorized")
    ),
    security(("Bearer" = [])),
    tag = "Helpdesk"
)]
pub(crate) async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filter): Query<TicketFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.helpdesk.list_tickets(&params, filter).await?;
    Ok(page_response(page))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let includes = params.includes(TICKET_INCLUDES, TICKET_DEFAULT_INCLUDES);
    let ticket = state.services.helpdesk.get_ticket(id).await?;

    let mut payload =
        serde_json::to_value(&ticket).map_err(|e| ServiceError::InternalError(e.to_string()))?;
    let object = payload
        .as_object_mut()
        .ok_or_else(|| ServiceError::InternalError("ticket did not serialize to an object".into()))?;

    for include in &includes {
        match include.as_str() {
            "comments" => {
                let comments = state.services.helpdesk.list_comments(id, true).await?;
                object.insert(
                    "comments".into(),
                    serde_json::to_value(comments).unwrap_or_default(),
                );
            }
            "watchers" => {
                let watchers = state.services.helpdesk.list_watchers(id).await?;
                object.insert(
                    "watchers".into(),
                    serde_json::to_value(watchers).unwrap_or_default(),
                );
            }
            "attachments" => {
                let attachments = state.services.helpdesk.list_attachments(id).await?;
                let shaped: Vec<_> = attachments
                    .into_iter()
                    .map(|attachment| {
                        let url = state.services.storage.url(&attachment.storage_key);
                        serde_json::json!({
                            "id": attachment.id,
                            "file_name": attachment.file_name,
                            "url": url,
                            "mime_type": attachment.mime_type,
                            "size_bytes": attachment.size_bytes,
                        })
                    })
                    .collect();
                object.insert("attachments".into(), serde_json::json!(shaped));
            }
            _ => {}
        }
    }

    Ok(success_response(payload))
}

async fn create_ticket(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateTicketInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.subject.trim().is_empty() {
        return Err(ServiceError::ValidationError("subject cannot be blank".into()));
    }
    let ticket = state.services.helpdesk.create_ticket(input).await?;
    Ok(created_response(ticket))
}

#[derive(Debug, Deserialize)]
struct AssignRequest {
    assignee_id: Option<i64>,
}

async fn assign_ticket(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<AssignRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state
        .services
        .helpdesk
        .assign_ticket(id, payload.assignee_id)
        .await?;
    Ok(success_response(ticket))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: TicketStatus,
}

async fn update_ticket_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state
        .services
        .helpdesk
        .change_status(id, payload.status)
        .await?;
    Ok(success_response(ticket))
}

// ---- comments -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommentListFilter {
    #[serde(default)]
    include_internal: bool,
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filter): Query<CommentListFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let comments = state
        .services
        .helpdesk
        .list_comments(id, filter.include_internal)
        .await?;
    Ok(success_response(comments))
}

async fn add_comment(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(input): axum::Json<AddCommentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    if input.body.trim().is_empty() {
        return Err(ServiceError::ValidationError("comment cannot be blank".into()));
    }
    let comment = state.services.helpdesk.add_comment(id, input).await?;
    Ok(created_response(comment))
}

// ---- watchers and tags --------------------------------------------------

#[derive(Debug, Deserialize)]
struct WatcherRequest {
    employee_id: i64,
}

async fn list_watchers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let watchers = state.services.helpdesk.list_watchers(id).await?;
    Ok(success_response(watchers))
}

async fn add_watcher(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<WatcherRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let watcher = state
        .services
        .helpdesk
        .add_watcher(id, payload.employee_id)
        .await?;
    Ok(created_response(watcher))
}

async fn remove_watcher(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path((id, employee_id)): Path<(Uuid, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.helpdesk.remove_watcher(id, employee_id).await?;
    Ok(no_content_response())
}

async fn tag_ticket(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(Uuid, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.helpdesk.tag_ticket(id, tag_id).await?;
    Ok(no_content_response())
}

async fn untag_ticket(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(Uuid, i64)>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.helpdesk.untag_ticket(id, tag_id).await?;
    Ok(no_content_response())
}

// ---- attachments --------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
struct UploadAttachmentRequest {
    #[validate(length(min = 1, max = 255))]
    file_name: String,
    content_base64: String,
    mime_type: Option<String>,
    comment_id: Option<i64>,
}

async fn add_attachment(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UploadAttachmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let bytes = decode_file_content(&payload.content_base64)?;
    let size_bytes = bytes.len() as i64;
    let key = state
        .services
        .storage
        .put("tickets/attachments", &payload.file_name, &bytes)
        .await?;
    let attachment = state
        .services
        .helpdesk
        .add_attachment(
            id,
            payload.comment_id,
            key,
            payload.file_name,
            payload.mime_type,
            size_bytes,
        )
        .await?;
    Ok(created_response(attachment))
}

async fn list_attachments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let attachments = state.services.helpdesk.list_attachments(id).await?;
    Ok(success_response(attachments))
}

// ---- categories, queues, tags, SLA policies -----------------------------

#[derive(Debug, Deserialize, Validate)]
struct NamedRequest {
    #[validate(length(min = 1, max = 128))]
    name: String,
    description: Option<String>,
}

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.helpdesk.list_categories().await?;
    Ok(success_response(categories))
}

async fn create_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<NamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let category = state
        .services
        .helpdesk
        .create_category(payload.name, payload.description)
        .await?;
    Ok(created_response(category))
}

async fn list_queues(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let queues = state.services.helpdesk.list_queues().await?;
    Ok(success_response(queues))
}

async fn create_queue(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<NamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let queue = state
        .services
        .helpdesk
        .create_queue(payload.name, payload.description)
        .await?;
    Ok(created_response(queue))
}

async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let tags = state.services.helpdesk.list_tags().await?;
    Ok(success_response(tags))
}

#[derive(Debug, Deserialize, Validate)]
struct TagRequest {
    #[validate(length(min = 1, max = 64))]
    name: String,
    color: Option<String>,
}

async fn create_tag(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<TagRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let tag = state
        .services
        .helpdesk
        .create_tag(payload.name, payload.color)
        .await?;
    Ok(created_response(tag))
}

async fn list_policies(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let policies = state.services.helpdesk.list_policies().await?;
    Ok(success_response(policies))
}

async fn create_policy(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    axum::Json(input): axum::Json<CreateSlaPolicyInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let policy = state.services.helpdesk.create_policy(input).await?;
    Ok(created_response(policy))
}
