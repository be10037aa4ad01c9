use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::product;
use crate::entities::commerce::{order, order_item, quote, quote_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::orders::{next_number, OrderStatus};
use chrono::{DateTime, Utc};
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
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Converted,
}

impl QuoteStatus {
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Draft, Sent)
                | (Sent, Accepted)
                | (Sent, Declined)
                | (Accepted, Converted)
        )
    }
}

#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const QUOTE_SEARCH: &[quote::Column] = &[quote::Column::QuoteNumber, quote::Column::Notes];

const QUOTE_SORT: &[quote::Column] = &[
    quote::Column::QuoteNumber,
    quote::Column::Status,
    quote::Column::Total,
    quote::Column::CreatedAt,
];

impl QuoteService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        status: Option<QuoteStatus>,
        client_id: Option<i64>,
    ) -> Result<Page<quote::Model>, ServiceError> {
        let mut query = quote::Entity::find();
        query = list_query::apply_search(query, params.search(), QUOTE_SEARCH);
        if let Some(status) = status {
            query = query.filter(quote::Column::Status.eq(status.as_ref()));
        }
        if let Some(client_id) = client_id {
            query = query.filter(quote::Column::ClientId.eq(client_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            QUOTE_SORT,
            quote::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<quote::Model, ServiceError> {
        quote::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_items(&self, quote_id: i64) -> Result<Vec<quote_item::Model>, ServiceError> {
        self.get(quote_id).await?;
        quote_item::Entity::find()
            .filter(quote_item::Column::QuoteId.eq(quote_id))
            .order_by_asc(quote_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateQuoteInput) -> Result<quote::Model, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a quote needs at least one item".into(),
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
                        "unknown product {} in quote line",
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

        let quote_number = next_number("QTE", quote::Entity::find().count(&*self.db).await?);

        let txn = self.db.begin().await?;
        let created = quote::ActiveModel {
            quote_number: Set(quote_number),
            client_id: Set(input.client_id),
            status: Set(QuoteStatus::Draft.to_string()),
            currency: Set(input.currency),
            subtotal: Set(subtotal),
            tax_total: Set(tax_total),
            total: Set(subtotal + tax_total),
            valid_until: Set(input.valid_until),
            notes: Set(input.notes),
            converted_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (product, unit_price, tax_rate, line_total, item) in lines {
            quote_item::ActiveModel {
                quote_id: Set(created.id),
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

        info!(quote_id = created.id, "created quote");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: i64,
        next: QuoteStatus,
    ) -> Result<quote::Model, ServiceError> {
        if next == QuoteStatus::Converted {
            return Err(ServiceError::InvalidTransition(
                "use the convert endpoint to convert a quote".into(),
            ));
        }
        let existing = self.get(id).await?;
        let current = QuoteStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "quote {id}: {current} -> {next}"
            )));
        }

        let mut active: quote::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Convert an accepted quote into an order. The order mirrors the
    /// quote's lines and totals; the quote ends up `converted` and keeps a
    /// pointer to the order. Converting twice is a conflict.
    #[instrument(skip(self))]
    pub async fn convert_to_order(&self, id: i64) -> Result<order::Model, ServiceError> {
        let existing = self.get(id).await?;
        let current = QuoteStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;

        if current == QuoteStatus::Converted {
            return Err(ServiceError::Conflict(format!(
                "quote {id} was already converted"
            )));
        }
        if current != QuoteStatus::Accepted {
            return Err(ServiceError::InvalidTransition(format!(
                "quote {id}: only accepted quotes convert (currently {current})"
            )));
        }

        let items = quote_item::Entity::find()
            .filter(quote_item::Column::QuoteId.eq(id))
            .all(&*self.db)
            .await?;

        let now = Utc::now();
        let order_number = next_number("ORD", order::Entity::find().count(&*self.db).await?);

        let txn = self.db.begin().await?;
        let order = order::ActiveModel {
            order_number: Set(order_number),
            client_id: Set(existing.client_id),
            status: Set(OrderStatus::Confirmed.to_string()),
            currency: Set(existing.currency.clone()),
            subtotal: Set(existing.subtotal),
            tax_total: Set(existing.tax_total),
            total: Set(existing.total),
            notes: Set(existing.notes.clone()),
            ordered_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for item in items {
            order_item::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                description: Set(item.description),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                tax_rate: Set(item.tax_rate),
                total: Set(item.total),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let mut active: quote::ActiveModel = existing.into();
        active.status = Set(QuoteStatus::Converted.to_string());
        active.converted_order_id = Set(Some(order.id));
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::QuoteConverted {
                quote_id: id,
                order_id: order.id,
            })
            .await;
        info!(quote_id = id, order_id = order.id, "converted quote");
        Ok(order)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteInput {
    pub client_id: i64,
    pub currency: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<QuoteLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteLineInput {
    pub product_id: Uuid,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_convert_from_accepted() {
        use QuoteStatus::*;
        assert!(Accepted.can_transition_to(Converted));
        assert!(!Draft.can_transition_to(Converted));
        assert!(!Declined.can_transition_to(Converted));
    }
}
