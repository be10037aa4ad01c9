use crate::db::list_query::{self, ListParams, Page};
use crate::entities::finance::{
    financial_transaction,
    financial_transaction::{TransactionDirection, TransactionStatus},
    financial_transaction_reminder,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Financial transactions (planned and settled money movements) and their
/// reminders. A periodic sweep flips planned rows past their due date to
/// overdue.
#[derive(Clone)]
pub struct FinanceService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const TRANSACTION_SEARCH: &[financial_transaction::Column] = &[
    financial_transaction::Column::Label,
    financial_transaction::Column::Notes,
];

const TRANSACTION_SORT: &[financial_transaction::Column] = &[
    financial_transaction::Column::Label,
    financial_transaction::Column::Amount,
    financial_transaction::Column::Status,
    financial_transaction::Column::DueAt,
    financial_transaction::Column::CreatedAt,
];

impl FinanceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: TransactionFilter,
    ) -> Result<Page<financial_transaction::Model>, ServiceError> {
        let mut query = financial_transaction::Entity::find();
        query = list_query::apply_search(query, params.search(), TRANSACTION_SEARCH);
        if let Some(direction) = filter.direction {
            query = query.filter(financial_transaction::Column::Direction.eq(direction.as_ref()));
        }
        if let Some(status) = filter.status {
            query = query.filter(financial_transaction::Column::Status.eq(status.as_ref()));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(financial_transaction::Column::ClientId.eq(client_id));
        }
        if let Some(provider_id) = filter.provider_id {
            query = query.filter(financial_transaction::Column::ProviderId.eq(provider_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            TRANSACTION_SORT,
            financial_transaction::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<financial_transaction::Model, ServiceError> {
        financial_transaction::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<financial_transaction::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be positive".into(),
            ));
        }

        let created = financial_transaction::ActiveModel {
            label: Set(input.label),
            direction: Set(input.direction.to_string()),
            status: Set(TransactionStatus::Planned.to_string()),
            amount: Set(input.amount),
            currency: Set(input.currency),
            invoice_id: Set(input.invoice_id),
            client_id: Set(input.client_id),
            provider_id: Set(input.provider_id),
            due_at: Set(input.due_at),
            paid_at: Set(None),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(transaction_id = created.id, "created financial transaction");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: i64) -> Result<financial_transaction::Model, ServiceError> {
        let updated = self.transition(id, TransactionStatus::Paid).await?;
        self.event_sender
            .send_or_log(Event::TransactionPaid(id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> Result<financial_transaction::Model, ServiceError> {
        self.transition(id, TransactionStatus::Canceled).await
    }

    async fn transition(
        &self,
        id: i64,
        next: TransactionStatus,
    ) -> Result<financial_transaction::Model, ServiceError> {
        let existing = self.get(id).await?;
        let current = TransactionStatus::from_str(&existing.status)
            .map_err(|_| ServiceError::InvalidStatus(existing.status.clone()))?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "transaction {id}: {current} -> {next}"
            )));
        }

        let now = Utc::now();
        let mut active: financial_transaction::ActiveModel = existing.into();
        active.status = Set(next.to_string());
        if next == TransactionStatus::Paid {
            active.paid_at = Set(Some(now));
        }
        active.updated_at = Set(Some(now));
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Flip planned transactions past their due date to overdue. Returns the
    /// number of rows flipped.
    #[instrument(skip(self))]
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let overdue = financial_transaction::Entity::find()
            .filter(financial_transaction::Column::Status.eq(TransactionStatus::Planned.as_ref()))
            .filter(financial_transaction::Column::DueAt.lte(now))
            .all(&*self.db)
            .await?;

        let mut flipped = 0u64;
        for row in overdue {
            let id = row.id;
            let mut active: financial_transaction::ActiveModel = row.into();
            active.status = Set(TransactionStatus::Overdue.to_string());
            active.updated_at = Set(Some(now));
            active.update(&*self.db).await?;
            flipped += 1;
            self.event_sender
                .send_or_log(Event::TransactionMarkedOverdue(id))
                .await;
        }
        Ok(flipped)
    }

    // ---- reminders ------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_reminder(
        &self,
        transaction_id: i64,
        remind_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<financial_transaction_reminder::Model, ServiceError> {
        self.get(transaction_id).await?;
        financial_transaction_reminder::ActiveModel {
            transaction_id: Set(transaction_id),
            remind_at: Set(remind_at),
            sent_at: Set(None),
            note: Set(note),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_reminders(
        &self,
        transaction_id: i64,
    ) -> Result<Vec<financial_transaction_reminder::Model>, ServiceError> {
        self.get(transaction_id).await?;
        financial_transaction_reminder::Entity::find()
            .filter(financial_transaction_reminder::Column::TransactionId.eq(transaction_id))
            .order_by_asc(financial_transaction_reminder::Column::RemindAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Mark due reminders sent (today just logs; the seam for outbound mail).
    #[instrument(skip(self))]
    pub async fn dispatch_due_reminders(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let due = financial_transaction_reminder::Entity::find()
            .filter(financial_transaction_reminder::Column::RemindAt.lte(now))
            .filter(financial_transaction_reminder::Column::SentAt.is_null())
            .all(&*self.db)
            .await?;

        let mut sent = 0u64;
        for reminder in due {
            info!(
                reminder_id = reminder.id,
                transaction_id = reminder.transaction_id,
                "transaction reminder due"
            );
            let mut active: financial_transaction_reminder::ActiveModel = reminder.into();
            active.sent_at = Set(Some(now));
            active.update(&*self.db).await?;
            sent += 1;
        }
        Ok(sent)
    }
}

/// Spawn the periodic overdue/reminder sweep.
pub fn start_finance_worker(service: FinanceService, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            if let Err(e) = service.sweep_overdue(now).await {
                error!("overdue sweep failed: {e}");
            }
            if let Err(e) = service.dispatch_due_reminders(now).await {
                error!("reminder dispatch failed: {e}");
            }
        }
    });
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilter {
    pub direction: Option<TransactionDirection>,
    pub status: Option<TransactionStatus>,
    pub client_id: Option<i64>,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub label: String,
    pub direction: TransactionDirection,
    pub amount: Decimal,
    pub currency: String,
    pub invoice_id: Option<i64>,
    pub client_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub due_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
