use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::product;
use crate::entities::commerce::{
    web_order,
    web_order::WebOrderLine,
    web_order_status_history,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::promotions::{discount_amount, PromotionService};
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
pub enum WebOrderStatus {
    Received,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl WebOrderStatus {
    pub fn can_transition_to(self, next: WebOrderStatus) -> bool {
        use WebOrderStatus::*;
        matches!(
            (self, next),
            (Received, Processing)
                | (Received, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

/// Guest checkout orders placed by the storefront, tracked publicly by
/// order number + email. Every status change lands in the history table.
#[derive(Clone)]
pub struct WebOrderService {
    db: Arc<DatabaseConnection>,
    promotions: PromotionService,
    event_sender: Arc<EventSender>,
}

const WEB_ORDER_SEARCH: &[web_order::Column] = &[
    web_order::Column::OrderNumber,
    web_order::Column::CustomerName,
    web_order::Column::CustomerEmail,
];

const WEB_ORDER_SORT: &[web_order::Column] = &[
    web_order::Column::OrderNumber,
    web_order::Column::Status,
    web_order::Column::Total,
    web_order::Column::CreatedAt,
];

impl WebOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        promotions: PromotionService,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            promotions,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        status: Option<WebOrderStatus>,
    ) -> Result<Page<web_order::Model>, ServiceError> {
        let mut query = web_order::Entity::find();
        query = list_query::apply_search(query, params.search(), WEB_ORDER_SEARCH);
        if let Some(status) = status {
            query = query.filter(web_order::Column::Status.eq(status.as_ref()));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            WEB_ORDER_SORT,
            web_order::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<web_order::Model, ServiceError> {
        web_order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Web order {id} not found")))
    }

    /// Guest checkout. Lines are validated against active products, prices
    /// snapshotted server-side, and an optional promotion code applied.
    #[instrument(skip(self, input))]
    pub async fn place(&self, input: PlaceWebOrderInput) -> Result<web_order::Model, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "the cart is empty".into(),
            ));
        }
        if input.customer_email.trim().is_empty() || !input.customer_email.contains('@') {
            return Err(ServiceError::ValidationError(
                "a valid customer email is required".into(),
            ));
        }

        let now = Utc::now();
        let mut lines = Vec::with_capacity(input.items.len());
        let mut subtotal = Decimal::ZERO;

        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "item quantity must be positive".into(),
                ));
            }
            let product = product::Entity::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .filter(|p| p.is_active && p.deleted_at.is_none())
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "product {} is not available",
                        item.product_id
                    ))
                })?;

            subtotal += product.price * Decimal::from(item.quantity);
            lines.push(WebOrderLine {
                product_id: product.id,
                name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let (discount_total, promotion_code_id) = match &input.promotion_code {
            Some(raw) => {
                let (promotion, code) = self.promotions.validate_code(raw, now).await?;
                (discount_amount(&promotion, subtotal), Some(code.id))
            }
            None => (Decimal::ZERO, None),
        };

        let seq = web_order::Entity::find().count(&*self.db).await?;
        let order_number = format!("WEB-{:06}", seq + 1);
        let status = WebOrderStatus::Received;

        let txn = self.db.begin().await?;
        let created = web_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number),
            customer_name: Set(input.customer_name),
            customer_email: Set(input.customer_email.trim().to_ascii_lowercase()),
            customer_phone: Set(input.customer_phone),
            shipping_address: Set(input.shipping_address),
            status: Set(status.to_string()),
            currency: Set(input.currency.unwrap_or_else(|| "EUR".to_string())),
            items: Set(serde_json::to_value(&lines)
                .map_err(|e| ServiceError::InternalError(format!("serializing lines: {e}")))?),
            subtotal: Set(subtotal),
            discount_total: Set(discount_total),
            total: Set(subtotal - discount_total),
            promotion_code_id: Set(promotion_code_id),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        web_order_status_history::ActiveModel {
            web_order_id: Set(created.id),
            old_status: Set(None),
            new_status: Set(status.to_string()),
            comment: Set(Some("order placed".to_string())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        if let Some(code_id) = promotion_code_id {
            self.promotions.consume_code(code_id).await?;
        }

        self.event_sender
            .send_or_log(Event::WebOrderPlaced {
                web_order_id: created.id,
                order_number: created.order_number.clone(),
            })
            .await;
        info!(web_order_id = %created.id, "placed web order");
        Ok(created)
    }

    /// Public tracking: order number plus the email used at checkout.
    #[instrument(skip(self))]
    pub async fn track(
        &self,
        order_number: &str,
        email: &str,
    ) -> Result<(web_order::Model, Vec<web_order_status_history::Model>), ServiceError> {
        let order = web_order::Entity::find()
            .filter(web_order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_number} not found")))?;

        if !order.customer_email.eq_ignore_ascii_case(email.trim()) {
            // Same shape as an unknown order, to avoid probing.
            return Err(ServiceError::NotFound(format!(
                "Order {order_number} not found"
            )));
        }

        let history = self.history(order.id).await?;
        Ok((order, history))
    }

    #[instrument(skip(self))]
    pub async fn history(
        &self,
        id: Uuid,
    ) -> Result<Vec<web_order_status_history::Model>, ServiceError> {
        web_order_status_history::Entity::find()
            .filter(web_order_status_history::Column::WebOrderId.eq(id))
            .order_by_asc(web_order_status_history::Column::CreatedAt)
            .order_by_asc(web_order_status_history::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        next: WebOrderStatus,
        comment: Option<String>,
    ) -> Result<web_order::Model, ServiceError> {
        let existing = self.get(id).await?;
        let current = WebOrderStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "web order {id}: {current} -> {next}"
            )));
        }

        let now = Utc::now();
        let old_status = existing.status.clone();
        let txn = self.db.begin().await?;
        let mut active: web_order::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        web_order_status_history::ActiveModel {
            web_order_id: Set(id),
            old_status: Set(Some(old_status.clone())),
            new_status: Set(next.to_string()),
            comment: Set(comment),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::WebOrderStatusChanged {
                web_order_id: id,
                old_status,
                new_status: next.to_string(),
            })
            .await;
        Ok(updated)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PlaceWebOrderInput {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub currency: Option<String>,
    pub promotion_code: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<WebOrderItemInput>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct WebOrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_order_status_edges() {
        use WebOrderStatus::*;
        assert!(Received.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Processing));
    }
}
