use crate::db::list_query::{self, ListParams, Page};
use crate::entities::hr::{department, employee, holiday, leave_balance, leave_type};
use crate::errors::ServiceError;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// HR master data: departments, employees, holidays, leave types and the
/// yearly leave balances. The leave-request workflow lives in
/// `services::leave`.
#[derive(Clone)]
pub struct HrService {
    db: Arc<DatabaseConnection>,
}

const EMPLOYEE_SEARCH: &[employee::Column] = &[
    employee::Column::FirstName,
    employee::Column::LastName,
    employee::Column::Email,
    employee::Column::JobTitle,
];

const EMPLOYEE_SORT: &[employee::Column] = &[
    employee::Column::LastName,
    employee::Column::Email,
    employee::Column::HiredAt,
    employee::Column::CreatedAt,
];

impl HrService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ---- departments ----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_departments(
        &self,
        params: &ListParams,
    ) -> Result<Page<department::Model>, ServiceError> {
        let mut query = department::Entity::find();
        query = list_query::apply_search(query, params.search(), &[department::Column::Name]);
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[department::Column::Name, department::Column::CreatedAt],
            department::Column::Name,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_department(&self, id: i64) -> Result<department::Model, ServiceError> {
        department::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Department {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_department(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<department::Model, ServiceError> {
        department::ActiveModel {
            name: Set(name),
            description: Set(description),
            head_employee_id: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn update_department(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<department::Model, ServiceError> {
        let existing = self.get_department(id).await?;
        let mut active: department::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Assign (or clear) the department head. The head must be an employee
    /// of the department.
    #[instrument(skip(self))]
    pub async fn set_department_head(
        &self,
        id: i64,
        head_employee_id: Option<i64>,
    ) -> Result<department::Model, ServiceError> {
        let department = self.get_department(id).await?;

        if let Some(employee_id) = head_employee_id {
            let employee = self.get_employee(employee_id).await?;
            if employee.department_id != Some(id) {
                return Err(ServiceError::ValidationError(format!(
                    "employee {} does not belong to department {}",
                    employee_id, id
                )));
            }
        }

        let mut active: department::ActiveModel = department.into();
        active.head_employee_id = Set(head_employee_id);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_department(&self, id: i64) -> Result<(), ServiceError> {
        self.get_department(id).await?;
        department::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    // ---- employees ------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        params: &ListParams,
        department_id: Option<i64>,
        is_active: Option<bool>,
    ) -> Result<Page<employee::Model>, ServiceError> {
        let mut query = employee::Entity::find();
        query = list_query::visible(query, employee::Column::DeletedAt, params.with_deleted);
        query = list_query::apply_search(query, params.search(), EMPLOYEE_SEARCH);
        if let Some(department_id) = department_id {
            query = query.filter(employee::Column::DepartmentId.eq(department_id));
        }
        if let Some(is_active) = is_active {
            query = query.filter(employee::Column::IsActive.eq(is_active));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            EMPLOYEE_SORT,
            employee::Column::LastName,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: i64) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_employee(
        &self,
        input: EmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        if let Some(department_id) = input.department_id {
            self.get_department(department_id).await?;
        }
        if let Some(manager_id) = input.manager_id {
            self.get_employee(manager_id).await?;
        }

        let created = employee::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            job_title: Set(input.job_title),
            department_id: Set(input.department_id),
            manager_id: Set(input.manager_id),
            hired_at: Set(input.hired_at),
            is_active: Set(true),
            deleted_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(employee_id = created.id, "created employee");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_employee(
        &self,
        id: i64,
        input: EmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        let existing = self.get_employee(id).await?;

        if let Some(manager_id) = input.manager_id {
            if manager_id == id {
                return Err(ServiceError::ValidationError(
                    "an employee cannot be their own manager".into(),
                ));
            }
            self.get_employee(manager_id).await?;
        }
        if let Some(department_id) = input.department_id {
            self.get_department(department_id).await?;
        }

        let mut active: employee::ActiveModel = existing.into();
        active.first_name = Set(input.first_name);
        active.last_name = Set(input.last_name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.job_title = Set(input.job_title);
        active.department_id = Set(input.department_id);
        active.manager_id = Set(input.manager_id);
        active.hired_at = Set(input.hired_at);
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn archive_employee(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get_employee(id).await?;
        if existing.deleted_at.is_some() {
            return Ok(());
        }
        let mut active: employee::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        info!(employee_id = id, "archived employee");
        Ok(())
    }

    // ---- holidays -------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_holidays(&self, year: Option<i32>) -> Result<Vec<holiday::Model>, ServiceError> {
        let mut query = holiday::Entity::find().order_by_asc(holiday::Column::Date);
        if let Some(year) = year {
            let from = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            let to = NaiveDate::from_ymd_opt(year, 12, 31).unwrap();
            query = query
                .filter(holiday::Column::Date.gte(from))
                .filter(holiday::Column::Date.lte(to));
        }
        query.all(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_holiday(
        &self,
        name: String,
        date: NaiveDate,
    ) -> Result<holiday::Model, ServiceError> {
        holiday::ActiveModel {
            name: Set(name),
            date: Set(date),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_holiday(&self, id: i64) -> Result<(), ServiceError> {
        let deleted = holiday::Entity::delete_by_id(id).exec(&*self.db).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Holiday {id} not found")));
        }
        Ok(())
    }

    // ---- leave types ----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_leave_types(&self) -> Result<Vec<leave_type::Model>, ServiceError> {
        leave_type::Entity::find()
            .order_by_asc(leave_type::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_leave_type(&self, id: i64) -> Result<leave_type::Model, ServiceError> {
        leave_type::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Leave type {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_leave_type(
        &self,
        name: String,
        default_days_per_year: i32,
        is_paid: bool,
    ) -> Result<leave_type::Model, ServiceError> {
        leave_type::ActiveModel {
            name: Set(name),
            default_days_per_year: Set(default_days_per_year),
            is_paid: Set(is_paid),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    // ---- leave balances -------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_balances(
        &self,
        employee_id: Option<i64>,
        year: Option<i32>,
    ) -> Result<Vec<leave_balance::Model>, ServiceError> {
        let mut query = leave_balance::Entity::find();
        if let Some(employee_id) = employee_id {
            query = query.filter(leave_balance::Column::EmployeeId.eq(employee_id));
        }
        if let Some(year) = year {
            query = query.filter(leave_balance::Column::Year.eq(year));
        }
        query
            .order_by_asc(leave_balance::Column::EmployeeId)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Create or replace the allocation for (employee, type, year).
    #[instrument(skip(self))]
    pub async fn set_balance(
        &self,
        employee_id: i64,
        leave_type_id: i64,
        year: i32,
        allocated_days: Decimal,
    ) -> Result<leave_balance::Model, ServiceError> {
        self.get_employee(employee_id).await?;
        self.get_leave_type(leave_type_id).await?;

        let existing = leave_balance::Entity::find()
            .filter(leave_balance::Column::EmployeeId.eq(employee_id))
            .filter(leave_balance::Column::LeaveTypeId.eq(leave_type_id))
            .filter(leave_balance::Column::Year.eq(year))
            .one(&*self.db)
            .await?;

        match existing {
            Some(balance) => {
                let mut active: leave_balance::ActiveModel = balance.into();
                active.allocated_days = Set(allocated_days);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await.map_err(Into::into)
            }
            None => leave_balance::ActiveModel {
                employee_id: Set(employee_id),
                leave_type_id: Set(leave_type_id),
                year: Set(year),
                allocated_days: Set(allocated_days),
                used_days: Set(Decimal::ZERO),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
                ..Default::default()
            }
            .insert(&*self.db)
            .await
            .map_err(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub department_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub hired_at: Option<NaiveDate>,
    pub is_active: Option<bool>,
}
