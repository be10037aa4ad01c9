use crate::db::list_query::{self, ListParams, Page};
use crate::entities::commerce::client;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ClientService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const CLIENT_SEARCH: &[client::Column] = &[
    client::Column::Name,
    client::Column::Email,
    client::Column::VatNumber,
    client::Column::City,
];

const CLIENT_SORT: &[client::Column] = &[
    client::Column::Name,
    client::Column::City,
    client::Column::Country,
    client::Column::CreatedAt,
];

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        is_active: Option<bool>,
    ) -> Result<Page<client::Model>, ServiceError> {
        let mut query = client::Entity::find();
        query = list_query::visible(query, client::Column::DeletedAt, params.with_deleted);
        query = list_query::apply_search(query, params.search(), CLIENT_SEARCH);
        if let Some(is_active) = is_active {
            query = query.filter(client::Column::IsActive.eq(is_active));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            CLIENT_SORT,
            client::Column::Name,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: ClientInput) -> Result<client::Model, ServiceError> {
        let now = Utc::now();
        let created = client::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            vat_number: Set(input.vat_number),
            street: Set(input.street),
            city: Set(input.city),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            notes: Set(input.notes),
            is_active: Set(true),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ClientCreated(created.id))
            .await;
        info!(client_id = created.id, "created client");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, input: ClientInput) -> Result<client::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: client::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.vat_number = Set(input.vat_number);
        active.street = Set(input.street);
        active.city = Set(input.city);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.notes = Set(input.notes);
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Soft delete; the client stays referenced by orders and invoices.
    #[instrument(skip(self))]
    pub async fn archive(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        if existing.deleted_at.is_some() {
            return Ok(());
        }
        let mut active: client::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        info!(client_id = id, "archived client");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub vat_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}
