use crate::db::list_query::{self, ListParams, Page};
use crate::entities::helpdesk::{
    ticket,
    ticket::{TicketPriority, TicketStatus},
    ticket_attachment, ticket_category, ticket_comment, ticket_queue, ticket_sla_policy,
    ticket_tag, ticket_tag_link, ticket_watcher,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender, SlaBreachKind};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Helpdesk service: tickets with SLA tracking, comments, categories,
/// queues, tags, watchers and attachments.
#[derive(Clone)]
pub struct HelpdeskService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const TICKET_SEARCH: &[ticket::Column] = &[
    ticket::Column::TicketNumber,
    ticket::Column::Subject,
    ticket::Column::RequesterEmail,
];

const TICKET_SORT: &[ticket::Column] = &[
    ticket::Column::TicketNumber,
    ticket::Column::Status,
    ticket::Column::Priority,
    ticket::Column::FirstResponseDueAt,
    ticket::Column::ResolutionDueAt,
    ticket::Column::CreatedAt,
];

pub const TICKET_INCLUDES: &[&str] = &["comments", "watchers", "attachments", "tags"];
pub const TICKET_DEFAULT_INCLUDES: &[&str] = &[];

impl HelpdeskService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- tickets --------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_tickets(
        &self,
        params: &ListParams,
        filter: TicketFilter,
    ) -> Result<Page<ticket::Model>, ServiceError> {
        let mut query = ticket::Entity::find();
        query = list_query::apply_search(query, params.search(), TICKET_SEARCH);
        if let Some(status) = filter.status {
            query = query.filter(ticket::Column::Status.eq(status.as_ref()));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(ticket::Column::Priority.eq(priority.as_ref()));
        }
        if let Some(queue_id) = filter.queue_id {
            query = query.filter(ticket::Column::QueueId.eq(queue_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(ticket::Column::CategoryId.eq(category_id));
        }
        if let Some(assignee_id) = filter.assignee_id {
            query = query.filter(ticket::Column::AssigneeId.eq(assignee_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            TICKET_SORT,
            ticket::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_ticket(&self, id: Uuid) -> Result<ticket::Model, ServiceError> {
        ticket::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Ticket {id} not found")))
    }

    /// Open a ticket. The matching SLA policy (most specific first) sets the
    /// response/resolution deadlines relative to now.
    #[instrument(skip(self, input))]
    pub async fn create_ticket(&self, input: CreateTicketInput) -> Result<ticket::Model, ServiceError> {
        let priority = input.priority.unwrap_or(TicketPriority::Normal);
        let now = Utc::now();

        let policy = self.resolve_policy(priority, input.category_id).await?;
        let (policy_id, first_response_due, resolution_due) = match &policy {
            Some(p) => (
                Some(p.id),
                Some(now + ChronoDuration::minutes(p.first_response_minutes as i64)),
                Some(now + ChronoDuration::minutes(p.resolution_minutes as i64)),
            ),
            None => (None, None, None),
        };

        let seq = ticket::Entity::find().count(&*self.db).await?;
        let ticket_number = format!("TCK-{:06}", seq + 1);

        let created = ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_number: Set(ticket_number),
            subject: Set(input.subject),
            description: Set(input.description),
            client_id: Set(input.client_id),
            requester_email: Set(input.requester_email),
            status: Set(TicketStatus::Open.to_string()),
            priority: Set(priority.to_string()),
            category_id: Set(input.category_id),
            queue_id: Set(input.queue_id),
            assignee_id: Set(None),
            sla_policy_id: Set(policy_id),
            first_response_due_at: Set(first_response_due),
            resolution_due_at: Set(resolution_due),
            first_response_at: Set(None),
            resolved_at: Set(None),
            closed_at: Set(None),
            first_response_breached_at: Set(None),
            resolution_breached_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::TicketCreated(created.id))
            .await;
        info!(ticket_id = %created.id, number = %created.ticket_number, "opened ticket");
        Ok(created)
    }

    /// Pick the active policy for (priority, category): a category-specific
    /// policy wins over the priority-wide one.
    #[instrument(skip(self))]
    pub async fn resolve_policy(
        &self,
        priority: TicketPriority,
        category_id: Option<i64>,
    ) -> Result<Option<ticket_sla_policy::Model>, ServiceError> {
        if let Some(category_id) = category_id {
            let specific = ticket_sla_policy::Entity::find()
                .filter(ticket_sla_policy::Column::Priority.eq(priority.as_ref()))
                .filter(ticket_sla_policy::Column::CategoryId.eq(category_id))
                .filter(ticket_sla_policy::Column::IsActive.eq(true))
                .one(&*self.db)
                .await?;
            if specific.is_some() {
                return Ok(specific);
            }
        }

        ticket_sla_policy::Entity::find()
            .filter(ticket_sla_policy::Column::Priority.eq(priority.as_ref()))
            .filter(ticket_sla_policy::Column::CategoryId.is_null())
            .filter(ticket_sla_policy::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn assign_ticket(
        &self,
        id: Uuid,
        assignee_id: Option<i64>,
    ) -> Result<ticket::Model, ServiceError> {
        let existing = self.get_ticket(id).await?;
        let mut active: ticket::ActiveModel = existing.into();
        active.assignee_id = Set(assignee_id);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        if let Some(assignee_id) = assignee_id {
            self.event_sender
                .send_or_log(Event::TicketAssigned {
                    ticket_id: id,
                    assignee_id,
                })
                .await;
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        next: TicketStatus,
    ) -> Result<ticket::Model, ServiceError> {
        let existing = self.get_ticket(id).await?;
        let current = TicketStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "ticket {id}: {current} -> {next}"
            )));
        }

        let now = Utc::now();
        let old_status = existing.status.clone();
        let mut active: ticket::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        match next {
            TicketStatus::Resolved => active.resolved_at = Set(Some(now)),
            TicketStatus::Closed => active.closed_at = Set(Some(now)),
            TicketStatus::Open => {
                // Reopening clears the resolution stamp.
                active.resolved_at = Set(None);
            }
            _ => {}
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::TicketStatusChanged {
                ticket_id: id,
                old_status,
                new_status: next.to_string(),
            })
            .await;
        Ok(updated)
    }

    // ---- comments -------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_comments(
        &self,
        ticket_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<ticket_comment::Model>, ServiceError> {
        self.get_ticket(ticket_id).await?;
        let mut query = ticket_comment::Entity::find()
            .filter(ticket_comment::Column::TicketId.eq(ticket_id));
        if !include_internal {
            query = query.filter(ticket_comment::Column::IsInternal.eq(false));
        }
        query
            .order_by_asc(ticket_comment::Column::CreatedAt)
            .order_by_asc(ticket_comment::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Add a comment. The first public staff comment stamps the ticket's
    /// first response time.
    #[instrument(skip(self, input))]
    pub async fn add_comment(
        &self,
        ticket_id: Uuid,
        input: AddCommentInput,
    ) -> Result<ticket_comment::Model, ServiceError> {
        let ticket = self.get_ticket(ticket_id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let comment = ticket_comment::ActiveModel {
            ticket_id: Set(ticket_id),
            author_employee_id: Set(input.author_employee_id),
            author_name: Set(input.author_name),
            body: Set(input.body),
            is_internal: Set(input.is_internal),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let is_staff_public = input.author_employee_id.is_some() && !input.is_internal;
        if is_staff_public && ticket.first_response_at.is_none() {
            let mut active: ticket::ActiveModel = ticket.into();
            active.first_response_at = Set(Some(now));
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }
        txn.commit().await?;

        Ok(comment)
    }

    // ---- watchers and tags ---------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_watcher(
        &self,
        ticket_id: Uuid,
        employee_id: i64,
    ) -> Result<ticket_watcher::Model, ServiceError> {
        self.get_ticket(ticket_id).await?;
        let existing = ticket_watcher::Entity::find()
            .filter(ticket_watcher::Column::TicketId.eq(ticket_id))
            .filter(ticket_watcher::Column::EmployeeId.eq(employee_id))
            .one(&*self.db)
            .await?;
        if let Some(watcher) = existing {
            return Ok(watcher);
        }
        ticket_watcher::ActiveModel {
            ticket_id: Set(ticket_id),
            employee_id: Set(employee_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn remove_watcher(&self, ticket_id: Uuid, employee_id: i64) -> Result<(), ServiceError> {
        ticket_watcher::Entity::delete_many()
            .filter(ticket_watcher::Column::TicketId.eq(ticket_id))
            .filter(ticket_watcher::Column::EmployeeId.eq(employee_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_watchers(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<ticket_watcher::Model>, ServiceError> {
        self.get_ticket(ticket_id).await?;
        ticket_watcher::Entity::find()
            .filter(ticket_watcher::Column::TicketId.eq(ticket_id))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn tag_ticket(&self, ticket_id: Uuid, tag_id: i64) -> Result<(), ServiceError> {
        self.get_ticket(ticket_id).await?;
        ticket_tag::Entity::find_by_id(tag_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tag {tag_id} not found")))?;

        let existing = ticket_tag_link::Entity::find_by_id((ticket_id, tag_id))
            .one(&*self.db)
            .await?;
        if existing.is_none() {
            ticket_tag_link::ActiveModel {
                ticket_id: Set(ticket_id),
                tag_id: Set(tag_id),
            }
            .insert(&*self.db)
            .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn untag_ticket(&self, ticket_id: Uuid, tag_id: i64) -> Result<(), ServiceError> {
        ticket_tag_link::Entity::delete_by_id((ticket_id, tag_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<ticket_tag::Model>, ServiceError> {
        ticket_tag::Entity::find()
            .order_by_asc(ticket_tag::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_tag(
        &self,
        name: String,
        color: Option<String>,
    ) -> Result<ticket_tag::Model, ServiceError> {
        ticket_tag::ActiveModel {
            name: Set(name),
            color: Set(color),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    // ---- attachments ----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_attachment(
        &self,
        ticket_id: Uuid,
        comment_id: Option<i64>,
        storage_key: String,
        file_name: String,
        mime_type: Option<String>,
        size_bytes: i64,
    ) -> Result<ticket_attachment::Model, ServiceError> {
        self.get_ticket(ticket_id).await?;
        ticket_attachment::ActiveModel {
            ticket_id: Set(ticket_id),
            comment_id: Set(comment_id),
            storage_key: Set(storage_key),
            file_name: Set(file_name),
            mime_type: Set(mime_type),
            size_bytes: Set(size_bytes),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_attachments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<ticket_attachment::Model>, ServiceError> {
        self.get_ticket(ticket_id).await?;
        ticket_attachment::Entity::find()
            .filter(ticket_attachment::Column::TicketId.eq(ticket_id))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    // ---- categories and queues -----------------------------------------

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<ticket_category::Model>, ServiceError> {
        ticket_category::Entity::find()
            .order_by_asc(ticket_category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<ticket_category::Model, ServiceError> {
        ticket_category::ActiveModel {
            name: Set(name),
            description: Set(description),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_queues(&self) -> Result<Vec<ticket_queue::Model>, ServiceError> {
        ticket_queue::Entity::find()
            .order_by_asc(ticket_queue::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_queue(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<ticket_queue::Model, ServiceError> {
        ticket_queue::ActiveModel {
            name: Set(name),
            description: Set(description),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    // ---- SLA policies ---------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_policies(&self) -> Result<Vec<ticket_sla_policy::Model>, ServiceError> {
        ticket_sla_policy::Entity::find()
            .order_by_asc(ticket_sla_policy::Column::Priority)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_policy(
        &self,
        input: CreateSlaPolicyInput,
    ) -> Result<ticket_sla_policy::Model, ServiceError> {
        if input.first_response_minutes <= 0 || input.resolution_minutes <= 0 {
            return Err(ServiceError::ValidationError(
                "SLA minutes must be positive".into(),
            ));
        }
        ticket_sla_policy::ActiveModel {
            name: Set(input.name),
            priority: Set(input.priority.to_string()),
            category_id: Set(input.category_id),
            first_response_minutes: Set(input.first_response_minutes),
            resolution_minutes: Set(input.resolution_minutes),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    // ---- SLA breach sweep ----------------------------------------------

    /// Stamp breach timestamps on overdue tickets. Returns how many tickets
    /// were stamped. Only open/pending tickets that have not already been
    /// stamped are considered.
    #[instrument(skip(self))]
    pub async fn sweep_sla_breaches(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let open_states = Condition::any()
            .add(ticket::Column::Status.eq(TicketStatus::Open.as_ref()))
            .add(ticket::Column::Status.eq(TicketStatus::Pending.as_ref()));

        let mut stamped = 0u64;

        // First-response deadline passed with no response recorded.
        let response_overdue = ticket::Entity::find()
            .filter(open_states.clone())
            .filter(ticket::Column::FirstResponseDueAt.lte(now))
            .filter(ticket::Column::FirstResponseAt.is_null())
            .filter(ticket::Column::FirstResponseBreachedAt.is_null())
            .all(&*self.db)
            .await?;

        for ticket_model in response_overdue {
            let id = ticket_model.id;
            let mut active: ticket::ActiveModel = ticket_model.into();
            active.first_response_breached_at = Set(Some(now));
            active.update(&*self.db).await?;
            stamped += 1;
            self.event_sender
                .send_or_log(Event::TicketSlaBreached {
                    ticket_id: id,
                    kind: SlaBreachKind::FirstResponse,
                })
                .await;
        }

        // Resolution deadline passed while still unresolved.
        let resolution_overdue = ticket::Entity::find()
            .filter(open_states)
            .filter(ticket::Column::ResolutionDueAt.lte(now))
            .filter(ticket::Column::ResolvedAt.is_null())
            .filter(ticket::Column::ResolutionBreachedAt.is_null())
            .all(&*self.db)
            .await?;

        for ticket_model in resolution_overdue {
            let id = ticket_model.id;
            let mut active: ticket::ActiveModel = ticket_model.into();
            active.resolution_breached_at = Set(Some(now));
            active.update(&*self.db).await?;
            stamped += 1;
            self.event_sender
                .send_or_log(Event::TicketSlaBreached {
                    ticket_id: id,
                    kind: SlaBreachKind::Resolution,
                })
                .await;
        }

        if stamped > 0 {
            warn!(stamped, "stamped SLA breaches");
        }
        Ok(stamped)
    }
}

/// Spawn the periodic breach sweep. Errors are logged, never fatal.
pub fn start_sla_worker(service: HelpdeskService, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = service.sweep_sla_breaches(Utc::now()).await {
                error!("SLA sweep failed: {e}");
            }
        }
    });
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub queue_id: Option<i64>,
    pub category_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketInput {
    pub subject: String,
    pub description: Option<String>,
    pub client_id: Option<i64>,
    pub requester_email: Option<String>,
    pub priority: Option<TicketPriority>,
    pub category_id: Option<i64>,
    pub queue_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentInput {
    pub author_employee_id: Option<i64>,
    pub author_name: Option<String>,
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSlaPolicyInput {
    pub name: String,
    pub priority: TicketPriority,
    pub category_id: Option<i64>,
    pub first_response_minutes: i32,
    pub resolution_minutes: i32,
}
