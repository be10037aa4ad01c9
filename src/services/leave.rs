use crate::db::list_query::{self, ListParams, Page};
use crate::entities::hr::{
    holiday, leave_balance, leave_request,
    leave_request::LeaveStatus,
    leave_request_action,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::hr::HrService;
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, Order,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

/// Leave-request workflow: submission, the two-stage approval
/// (manager, then HR), rejection and cancellation. Every transition stamps
/// its actor/timestamp columns and appends to the action log; the balance is
/// debited only on HR approval, atomically with the status flip.
#[derive(Clone)]
pub struct LeaveService {
    db: Arc<DatabaseConnection>,
    hr: HrService,
    event_sender: Arc<EventSender>,
}

const LEAVE_SORT: &[leave_request::Column] = &[
    leave_request::Column::StartDate,
    leave_request::Column::Status,
    leave_request::Column::SubmittedAt,
];

impl LeaveService {
    pub fn new(db: Arc<DatabaseConnection>, hr: HrService, event_sender: Arc<EventSender>) -> Self {
        Self { db, hr, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        params: &ListParams,
        filter: LeaveFilter,
    ) -> Result<Page<leave_request::Model>, ServiceError> {
        let mut query = leave_request::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(leave_request::Column::Status.eq(status.as_ref()));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(leave_request::Column::EmployeeId.eq(employee_id));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            LEAVE_SORT,
            leave_request::Column::SubmittedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<leave_request::Model, ServiceError> {
        leave_request::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Leave request {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn actions(
        &self,
        id: i64,
    ) -> Result<Vec<leave_request_action::Model>, ServiceError> {
        self.get(id).await?;
        leave_request_action::Entity::find()
            .filter(leave_request_action::Column::LeaveRequestId.eq(id))
            .order_by_asc(leave_request_action::Column::CreatedAt)
            .order_by_asc(leave_request_action::Column::Id)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Open a request at `pending_manager`. The requested span must cover at
    /// least one working day and fit the employee's balance for the year of
    /// the start date.
    #[instrument(skip(self))]
    pub async fn submit(&self, input: SubmitLeaveInput) -> Result<leave_request::Model, ServiceError> {
        if input.end_date < input.start_date {
            return Err(ServiceError::ValidationError(
                "end_date must not precede start_date".into(),
            ));
        }

        let employee = self.hr.get_employee(input.employee_id).await?;
        self.hr.get_leave_type(input.leave_type_id).await?;

        let holidays: HashSet<NaiveDate> = holiday::Entity::find()
            .filter(holiday::Column::Date.gte(input.start_date))
            .filter(holiday::Column::Date.lte(input.end_date))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();

        let days = working_days(input.start_date, input.end_date, &holidays);
        if days == 0 {
            return Err(ServiceError::ValidationError(
                "the requested period contains no working days".into(),
            ));
        }
        let working_days = Decimal::from(days);

        let balance = self
            .balance_for(input.employee_id, input.leave_type_id, input.start_date.year())
            .await?;
        if balance.remaining_days() < working_days {
            return Err(ServiceError::InsufficientBalance(format!(
                "requested {working_days} days, {} remaining",
                balance.remaining_days()
            )));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let created = leave_request::ActiveModel {
            employee_id: Set(input.employee_id),
            leave_type_id: Set(input.leave_type_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            working_days: Set(working_days),
            reason: Set(input.reason),
            status: Set(LeaveStatus::PendingManager.to_string()),
            manager_id: Set(employee.manager_id),
            manager_decided_at: Set(None),
            hr_employee_id: Set(None),
            hr_decided_at: Set(None),
            cancelled_at: Set(None),
            submitted_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        log_action(
            &txn,
            created.id,
            Some(input.employee_id),
            "submitted",
            None,
            LeaveStatus::PendingManager,
            None,
        )
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LeaveRequestSubmitted(created.id))
            .await;
        info!(leave_request_id = created.id, "submitted leave request");
        Ok(created)
    }

    /// Manager stage: forward to HR or reject.
    #[instrument(skip(self))]
    pub async fn manager_decide(
        &self,
        id: i64,
        manager_id: i64,
        approve: bool,
        comment: Option<String>,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get(id).await?;
        let current = parse_status(&request.status)?;
        let next = if approve {
            LeaveStatus::PendingHr
        } else {
            LeaveStatus::Rejected
        };
        ensure_transition(id, current, next)?;

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(next.to_string());
        active.manager_id = Set(Some(manager_id));
        active.manager_decided_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        log_action(
            &txn,
            id,
            Some(manager_id),
            if approve { "manager_approved" } else { "manager_rejected" },
            Some(current),
            next,
            comment,
        )
        .await?;
        txn.commit().await?;

        self.emit_status_change(id, current, next).await;
        Ok(updated)
    }

    /// HR stage: final approval debits the balance in the same transaction.
    #[instrument(skip(self))]
    pub async fn hr_decide(
        &self,
        id: i64,
        hr_employee_id: i64,
        approve: bool,
        comment: Option<String>,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get(id).await?;
        let current = parse_status(&request.status)?;
        let next = if approve {
            LeaveStatus::Approved
        } else {
            LeaveStatus::Rejected
        };
        ensure_transition(id, current, next)?;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        if approve {
            let balance = self
                .balance_for(request.employee_id, request.leave_type_id, request.start_date.year())
                .await?;
            if balance.remaining_days() < request.working_days {
                return Err(ServiceError::InsufficientBalance(format!(
                    "requested {} days, {} remaining",
                    request.working_days,
                    balance.remaining_days()
                )));
            }
            let used = balance.used_days + request.working_days;
            let mut balance_active: leave_balance::ActiveModel = balance.into();
            balance_active.used_days = Set(used);
            balance_active.updated_at = Set(Some(now));
            balance_active.update(&txn).await?;
        }

        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(next.to_string());
        active.hr_employee_id = Set(Some(hr_employee_id));
        active.hr_decided_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        log_action(
            &txn,
            id,
            Some(hr_employee_id),
            if approve { "hr_approved" } else { "hr_rejected" },
            Some(current),
            next,
            comment,
        )
        .await?;
        txn.commit().await?;

        self.emit_status_change(id, current, next).await;
        info!(leave_request_id = id, approved = approve, "HR decision recorded");
        Ok(updated)
    }

    /// The requesting employee may withdraw while the request is pending.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        id: i64,
        actor_employee_id: i64,
        comment: Option<String>,
    ) -> Result<leave_request::Model, ServiceError> {
        let request = self.get(id).await?;
        let current = parse_status(&request.status)?;
        ensure_transition(id, current, LeaveStatus::Cancelled)?;

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(LeaveStatus::Cancelled.to_string());
        active.cancelled_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        log_action(
            &txn,
            id,
            Some(actor_employee_id),
            "cancelled",
            Some(current),
            LeaveStatus::Cancelled,
            comment,
        )
        .await?;
        txn.commit().await?;

        self.emit_status_change(id, current, LeaveStatus::Cancelled).await;
        Ok(updated)
    }

    async fn balance_for(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        year: i32,
    ) -> Result<leave_balance::Model, ServiceError> {
        leave_balance::Entity::find()
            .filter(leave_balance::Column::EmployeeId.eq(employee_id))
            .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_balance::Column::Year.eq(year))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InsufficientBalance(format!(
                    "no leave balance for employee {employee_id} in {year}"
                ))
            })
    }

    async fn emit_status_change(&self, id: i64, from: LeaveStatus, to: LeaveStatus) {
        self.event_sender
            .send_or_log(Event::LeaveRequestStatusChanged {
                leave_request_id: id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
    }
}

fn parse_status(raw: &str) -> Result<LeaveStatus, ServiceError> {
    LeaveStatus::from_str(raw).map_err(|_| ServiceError::InvalidStatus(raw.to_string()))
}

fn ensure_transition(id: i64, from: LeaveStatus, to: LeaveStatus) -> Result<(), ServiceError> {
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidTransition(format!(
            "leave request {id}: {from} -> {to}"
        )));
    }
    Ok(())
}

async fn log_action(
    txn: &DatabaseTransaction,
    leave_request_id: i64,
    actor_employee_id: Option<i64>,
    action: &str,
    from: Option<LeaveStatus>,
    to: LeaveStatus,
    comment: Option<String>,
) -> Result<(), ServiceError> {
    leave_request_action::ActiveModel {
        leave_request_id: Set(leave_request_id),
        actor_employee_id: Set(actor_employee_id),
        action: Set(action.to_string()),
        from_status: Set(from.map(|s| s.to_string())),
        to_status: Set(to.to_string()),
        comment: Set(comment),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    Ok(())
}

/// Count working days in `[start, end]`, skipping weekends and holidays.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        let weekday = day.weekday();
        if weekday != Weekday::Sat && weekday != Weekday::Sun && !holidays.contains(&day) {
            count += 1;
        }
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    count
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeaveFilter {
    pub status: Option<LeaveStatus>,
    pub employee_id: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitLeaveInput {
    pub employee_id: i64,
    pub leave_type_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn working_days_skip_weekends() {
        // 2024-07-01 is a Monday; the span covers one full week.
        let days = working_days(date(2024, 7, 1), date(2024, 7, 7), &HashSet::new());
        assert_eq!(days, 5);
    }

    #[test]
    fn working_days_skip_holidays() {
        let mut holidays = HashSet::new();
        holidays.insert(date(2024, 7, 4));
        let days = working_days(date(2024, 7, 1), date(2024, 7, 5), &holidays);
        assert_eq!(days, 4);
    }

    #[test]
    fn weekend_only_span_has_no_working_days() {
        let days = working_days(date(2024, 7, 6), date(2024, 7, 7), &HashSet::new());
        assert_eq!(days, 0);
    }

    #[test]
    fn single_holiday_on_weekend_does_not_double_count() {
        let mut holidays = HashSet::new();
        holidays.insert(date(2024, 7, 6)); // Saturday
        let days = working_days(date(2024, 7, 5), date(2024, 7, 8), &HashSet::new());
        let days_with = working_days(date(2024, 7, 5), date(2024, 7, 8), &holidays);
        assert_eq!(days, days_with);
    }
}
