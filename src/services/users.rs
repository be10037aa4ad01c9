use crate::auth::AuthService;
use crate::db::list_query::{self, ListParams, Page};
use crate::entities::users;
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const VALID_ROLES: &[&str] = &[
    "admin",
    "manager",
    "hr",
    "agent",
    "accountant",
    "editor",
    "employee",
];

/// Back-office account administration.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<Page<users::Model>, ServiceError> {
        let mut query = users::Entity::find();
        query = list_query::apply_search(
            query,
            params.search(),
            &[users::Column::Email, users::Column::DisplayName],
        );
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[users::Column::Email, users::Column::Role, users::Column::CreatedAt],
            users::Column::Email,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<users::Model, ServiceError> {
        users::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, ServiceError> {
        if !VALID_ROLES.contains(&input.role.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "unknown role {}",
                input.role
            )));
        }

        let email = input.email.trim().to_ascii_lowercase();
        let exists = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;
        if exists.is_some() {
            return Err(ServiceError::Conflict(format!("email {email} already registered")));
        }

        let password_hash = AuthService::hash_password(&input.password)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let created = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            display_name: Set(input.display_name),
            role: Set(input.role),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = %created.id, "created user");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> Result<users::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: users::ActiveModel = existing.into();

        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(role) = input.role {
            if !VALID_ROLES.contains(&role.as_str()) {
                return Err(ServiceError::ValidationError(format!("unknown role {role}")));
            }
            active.role = Set(role);
        }
        if let Some(password) = input.password {
            let hash = AuthService::hash_password(&password)
                .map_err(|e| ServiceError::InternalError(e.to_string()))?;
            active.password_hash = Set(hash);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}
