use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::product;
use crate::entities::commerce::{order, order_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumString};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed) | (Draft, Cancelled) | (Confirmed, Fulfilled) | (Confirmed, Cancelled)
        )
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const ORDER_SEARCH: &[order::Column] = &[order::Column::OrderNumber, order::Column::Notes];

const ORDER_SORT: &[order::Column] = &[
    order::Column::OrderNumber,
    order::Column::Status,
    order::Column::Total,
    order::Column::OrderedAt,
    order::Column::CreatedAt,
];

pub const ORDER_INCLUDES: &[&str] = &["items", "client"];
pub const ORDER_DEFAULT_INCLUDES: &[&str] = &["items"];

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: OrderFilter,
    ) -> Result<Page<order::Model>, ServiceError> {
        let mut query = order::Entity::find();
        query = list_query::apply_search(query, params.search(), ORDER_SEARCH);
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status.as_ref()));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(order::Column::ClientId.eq(client_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            ORDER_SORT,
            order::Column::OrderedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_items(&self, order_id: i64) -> Result<Vec<order_item::Model>, ServiceError> {
        self.get(order_id).await?;
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Create an order with its lines. Prices default to the product's
    /// current price; totals are computed here, not trusted from the client.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateOrderInput) -> Result<order::Model, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "an order needs at least one item".into(),
            ));
        }

        let now = Utc::now();
        let mut lines = Vec::with_capacity(input.items.len());
        let mut subtotal = Decimal::ZERO;
        let mut tax_total = Decimal::ZERO;

        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "item quantity must be positive".into(),
                ));
            }
            let product = product::Entity::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "unknown product {} in order line",
                        item.product_id
                    ))
                })?;

            let unit_price = item.unit_price.unwrap_or(product.price);
            let tax_rate = item.tax_rate.unwrap_or(Decimal::ZERO);
            let line_net = unit_price * Decimal::from(item.quantity);
            let line_tax = line_net * tax_rate / Decimal::from(100);

            subtotal += line_net;
            tax_total += line_tax;
            lines.push((product, unit_price, tax_rate, line_net + line_tax, item));
        }

        let order_number = next_number("ORD", order::Entity::find().count(&*self.db).await?);

        let txn = self.db.begin().await?;
        let created = order::ActiveModel {
            order_number: Set(order_number),
            client_id: Set(input.client_id),
            status: Set(OrderStatus::Draft.to_string()),
            currency: Set(input.currency),
            subtotal: Set(subtotal),
            tax_total: Set(tax_total),
            total: Set(subtotal + tax_total),
            notes: Set(input.notes),
            ordered_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (product, unit_price, tax_rate, line_total, item) in lines {
            order_item::ActiveModel {
                order_id: Set(created.id),
                product_id: Set(product.id),
                variant_id: Set(item.variant_id),
                description: Set(product.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                tax_rate: Set(tax_rate),
                total: Set(line_total),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(created.id))
            .await;
        info!(order_id = created.id, order_number = %created.order_number, "created order");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_notes(
        &self,
        id: i64,
        notes: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: order::ActiveModel = existing.into();
        active.notes = Set(notes);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: i64,
        next: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get(id).await?;
        let current = OrderStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;

        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "order {id}: {current} -> {next}"
            )));
        }

        let old_status = existing.status.clone();
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status,
                new_status: next.to_string(),
            })
            .await;
        Ok(updated)
    }
}

/// Sequential human-readable document numbers (ORD-000001, QTE-000001, ...).
pub fn next_number(prefix: &str, existing: u64) -> String {
    format!("{prefix}-{:06}", existing + 1)
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub client_id: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    /// Overrides the product's current price when set.
    pub unit_price: Option<Decimal>,
    /// Percentage, e.g. 20.0
    pub tax_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(next_number("ORD", 0), "ORD-000001");
        assert_eq!(next_number("INV", 41), "INV-000042");
    }

    #[test]
    fn order_status_edges() {
        use OrderStatus::*;
        assert!(Draft.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Fulfilled));
        assert!(!Fulfilled.can_transition_to(Draft));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        assert_eq!(OrderStatus::Draft.to_string(), "draft");
        assert_eq!(OrderStatus::from_str("fulfilled").unwrap(), OrderStatus::Fulfilled);
    }
}
