use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::product;
use crate::entities::stock::{
    provider, stock_movement, stock_movement_attachment, stock_movement_reason,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Stock service: providers, movement reasons, the movement ledger and its
/// attachments. Movements are the only writers of `products.stock_quantity`.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const PROVIDER_SEARCH: &[provider::Column] = &[
    provider::Column::Name,
    provider::Column::Email,
    provider::Column::VatNumber,
];

const MOVEMENT_SORT: &[stock_movement::Column] = &[
    stock_movement::Column::MovedAt,
    stock_movement::Column::Quantity,
    stock_movement::Column::CreatedAt,
];

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- providers ------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_providers(
        &self,
        params: &ListParams,
    ) -> Result<Page<provider::Model>, ServiceError> {
        let mut query = provider::Entity::find();
        query = list_query::visible(query, provider::Column::DeletedAt, params.with_deleted);
        query = list_query::apply_search(query, params.search(), PROVIDER_SEARCH);
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[provider::Column::Name, provider::Column::CreatedAt],
            provider::Column::Name,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_provider(&self, id: i64) -> Result<provider::Model, ServiceError> {
        provider::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Provider {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_provider(
        &self,
        input: ProviderInput,
    ) -> Result<provider::Model, ServiceError> {
        provider::ActiveModel {
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
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn update_provider(
        &self,
        id: i64,
        input: ProviderInput,
    ) -> Result<provider::Model, ServiceError> {
        let existing = self.get_provider(id).await?;
        let mut active: provider::ActiveModel = existing.into();
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

    #[instrument(skip(self))]
    pub async fn archive_provider(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get_provider(id).await?;
        if existing.deleted_at.is_some() {
            return Ok(());
        }
        let mut active: provider::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        Ok(())
    }

    // ---- movement reasons ----------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_reasons(&self) -> Result<Vec<stock_movement_reason::Model>, ServiceError> {
        stock_movement_reason::Entity::find()
            .order_by_asc(stock_movement_reason::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_reason(&self, id: i64) -> Result<stock_movement_reason::Model, ServiceError> {
        stock_movement_reason::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement reason {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_reason(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<stock_movement_reason::Model, ServiceError> {
        stock_movement_reason::ActiveModel {
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

    // ---- movements ------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        params: &ListParams,
        filter: MovementFilter,
    ) -> Result<Page<stock_movement::Model>, ServiceError> {
        let mut query = stock_movement::Entity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_movement::Column::ProductId.eq(product_id));
        }
        if let Some(reason_id) = filter.reason_id {
            query = query.filter(stock_movement::Column::ReasonId.eq(reason_id));
        }
        if let Some(provider_id) = filter.provider_id {
            query = query.filter(stock_movement::Column::ProviderId.eq(provider_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            MOVEMENT_SORT,
            stock_movement::Column::MovedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: i64) -> Result<stock_movement::Model, ServiceError> {
        stock_movement::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock movement {id} not found")))
    }

    /// Record a movement and apply its delta to the product in the same
    /// transaction. A movement that would drive stock negative is rejected
    /// and nothing is written.
    #[instrument(skip(self))]
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<stock_movement::Model, ServiceError> {
        if input.quantity == 0 {
            return Err(ServiceError::ValidationError(
                "movement quantity cannot be zero".into(),
            ));
        }
        self.get_reason(input.reason_id).await?;
        if let Some(provider_id) = input.provider_id {
            self.get_provider(provider_id).await?;
        }

        let txn = self.db.begin().await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let new_quantity = product.stock_quantity + input.quantity;
        if new_quantity < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "product {} holds {} units, movement of {} rejected",
                product.sku, product.stock_quantity, input.quantity
            )));
        }

        let product_id = product.id;
        let mut product_active: product::ActiveModel = product.into();
        product_active.stock_quantity = Set(new_quantity);
        product_active.updated_at = Set(Some(Utc::now()));
        product_active.update(&txn).await?;

        let movement = stock_movement::ActiveModel {
            product_id: Set(product_id),
            variant_id: Set(input.variant_id),
            reason_id: Set(input.reason_id),
            provider_id: Set(input.provider_id),
            quantity: Set(input.quantity),
            note: Set(input.note),
            moved_at: Set(input.moved_at.unwrap_or_else(Utc::now)),
            created_by: Set(input.created_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                movement_id: movement.id,
                product_id,
                quantity: movement.quantity,
            })
            .await;
        info!(
            movement_id = movement.id,
            quantity = movement.quantity,
            "recorded stock movement"
        );
        Ok(movement)
    }

    // ---- attachments ----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_attachment(
        &self,
        movement_id: i64,
        storage_key: String,
        file_name: String,
        mime_type: Option<String>,
    ) -> Result<stock_movement_attachment::Model, ServiceError> {
        self.get_movement(movement_id).await?;
        stock_movement_attachment::ActiveModel {
            stock_movement_id: Set(movement_id),
            storage_key: Set(storage_key),
            file_name: Set(file_name),
            mime_type: Set(mime_type),
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
        movement_id: i64,
    ) -> Result<Vec<stock_movement_attachment::Model>, ServiceError> {
        self.get_movement(movement_id).await?;
        stock_movement_attachment::Entity::find()
            .filter(stock_movement_attachment::Column::StockMovementId.eq(movement_id))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderInput {
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

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub reason_id: Option<i64>,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecordMovementInput {
    pub product_id: Uuid,
    pub variant_id: Option<i64>,
    pub reason_id: i64,
    pub provider_id: Option<i64>,
    /// Signed delta: positive receives stock, negative issues it.
    pub quantity: i32,
    pub note: Option<String>,
    pub moved_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}
