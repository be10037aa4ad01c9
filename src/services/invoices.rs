use crate::db::list_query::{self, ListParams, Page};
use crate::entities::commerce::{invoice, invoice_item, order, order_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::orders::next_number;
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
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Issued) | (Draft, Cancelled) | (Issued, Paid) | (Issued, Cancelled)
        )
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const INVOICE_SEARCH: &[invoice::Column] = &[invoice::Column::InvoiceNumber, invoice::Column::Notes];

const INVOICE_SORT: &[invoice::Column] = &[
    invoice::Column::InvoiceNumber,
    invoice::Column::Status,
    invoice::Column::Total,
    invoice::Column::IssuedAt,
    invoice::Column::DueAt,
    invoice::Column::CreatedAt,
];

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        status: Option<InvoiceStatus>,
        client_id: Option<i64>,
    ) -> Result<Page<invoice::Model>, ServiceError> {
        let mut query = invoice::Entity::find();
        query = list_query::apply_search(query, params.search(), INVOICE_SEARCH);
        if let Some(status) = status {
            query = query.filter(invoice::Column::Status.eq(status.as_ref()));
        }
        if let Some(client_id) = client_id {
            query = query.filter(invoice::Column::ClientId.eq(client_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            INVOICE_SORT,
            invoice::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<invoice::Model, ServiceError> {
        invoice::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_items(&self, invoice_id: i64) -> Result<Vec<invoice_item::Model>, ServiceError> {
        self.get(invoice_id).await?;
        invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<invoice::Model, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "an invoice needs at least one line".into(),
            ));
        }

        let mut subtotal = Decimal::ZERO;
        let mut tax_total = Decimal::ZERO;
        for line in &input.items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "line quantity must be positive".into(),
                ));
            }
            let net = line.unit_price * Decimal::from(line.quantity);
            subtotal += net;
            tax_total += net * line.tax_rate.unwrap_or(Decimal::ZERO) / Decimal::from(100);
        }

        let invoice_number = next_number("INV", invoice::Entity::find().count(&*self.db).await?);
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let created = invoice::ActiveModel {
            invoice_number: Set(invoice_number),
            client_id: Set(input.client_id),
            order_id: Set(input.order_id),
            status: Set(InvoiceStatus::Draft.to_string()),
            currency: Set(input.currency),
            subtotal: Set(subtotal),
            tax_total: Set(tax_total),
            total: Set(subtotal + tax_total),
            issued_at: Set(None),
            due_at: Set(input.due_at),
            paid_at: Set(None),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for line in input.items {
            let net = line.unit_price * Decimal::from(line.quantity);
            let tax_rate = line.tax_rate.unwrap_or(Decimal::ZERO);
            invoice_item::ActiveModel {
                invoice_id: Set(created.id),
                product_id: Set(line.product_id),
                description: Set(line.description),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                tax_rate: Set(tax_rate),
                total: Set(net + net * tax_rate / Decimal::from(100)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(invoice_id = created.id, "created invoice");
        Ok(created)
    }

    /// Build a draft invoice from an order's lines.
    #[instrument(skip(self))]
    pub async fn create_from_order(
        &self,
        order_id: i64,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<invoice::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        let lines = items
            .into_iter()
            .map(|item| InvoiceLineInput {
                product_id: Some(item.product_id),
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                tax_rate: Some(item.tax_rate),
            })
            .collect();

        self.create(CreateInvoiceInput {
            client_id: order.client_id,
            order_id: Some(order_id),
            currency: order.currency,
            due_at,
            notes: None,
            items: lines,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: i64,
        next: InvoiceStatus,
    ) -> Result<invoice::Model, ServiceError> {
        let existing = self.get(id).await?;
        let current = InvoiceStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "invoice {id}: {current} -> {next}"
            )));
        }

        let now = Utc::now();
        let mut active: invoice::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        match next {
            InvoiceStatus::Issued => active.issued_at = Set(Some(now)),
            InvoiceStatus::Paid => active.paid_at = Set(Some(now)),
            _ => {}
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;

        match next {
            InvoiceStatus::Issued => {
                self.event_sender.send_or_log(Event::InvoiceIssued(id)).await
            }
            InvoiceStatus::Paid => self.event_sender.send_or_log(Event::InvoicePaid(id)).await,
            _ => {}
        }
        Ok(updated)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceInput {
    pub client_id: i64,
    pub order_id: Option<i64>,
    pub currency: String,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<InvoiceLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceLineInput {
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub tax_rate: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_lifecycle_edges() {
        use InvoiceStatus::*;
        assert!(Draft.can_transition_to(Issued));
        assert!(Issued.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Issued));
    }
}
