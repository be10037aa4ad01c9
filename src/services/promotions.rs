use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::{promotion, promotion_code};
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Promotions and their redeemable codes. Code validation is shared by the
/// admin API and the storefront checkout.
#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DatabaseConnection>,
}

impl PromotionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, params: &ListParams) -> Result<Page<promotion::Model>, ServiceError> {
        let mut query = promotion::Entity::find();
        query = list_query::apply_search(query, params.search(), &[promotion::Column::Name]);
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[promotion::Column::Name, promotion::Column::StartsAt],
            promotion::Column::StartsAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<promotion::Model, ServiceError> {
        promotion::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreatePromotionInput) -> Result<promotion::Model, ServiceError> {
        if input.discount_kind != "percent" && input.discount_kind != "fixed" {
            return Err(ServiceError::ValidationError(
                "discount_kind must be 'percent' or 'fixed'".into(),
            ));
        }
        if input.discount_value <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount_value must be positive".into(),
            ));
        }
        if input.discount_kind == "percent" && input.discount_value > Decimal::from(100) {
            return Err(ServiceError::ValidationError(
                "percent discounts cannot exceed 100".into(),
            ));
        }

        promotion::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            discount_kind: Set(input.discount_kind),
            discount_value: Set(input.discount_value),
            starts_at: Set(input.starts_at),
            ends_at: Set(input.ends_at),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i64) -> Result<promotion::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: promotion::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn add_code(
        &self,
        promotion_id: i64,
        code: String,
        max_uses: Option<i32>,
    ) -> Result<promotion_code::Model, ServiceError> {
        self.get(promotion_id).await?;
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(ServiceError::ValidationError("code cannot be blank".into()));
        }

        promotion_code::ActiveModel {
            promotion_id: Set(promotion_id),
            code: Set(code),
            max_uses: Set(max_uses),
            times_used: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_codes(
        &self,
        promotion_id: i64,
    ) -> Result<Vec<promotion_code::Model>, ServiceError> {
        self.get(promotion_id).await?;
        promotion_code::Entity::find()
            .filter(promotion_code::Column::PromotionId.eq(promotion_id))
            .order_by_asc(promotion_code::Column::Code)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Validate a code for use right now: the promotion must be active and
    /// inside its window, the code under its usage cap.
    #[instrument(skip(self))]
    pub async fn validate_code(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<(promotion::Model, promotion_code::Model), ServiceError> {
        let code = raw_code.trim().to_ascii_uppercase();
        let code_row = promotion_code::Entity::find()
            .filter(promotion_code::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError(format!("unknown promotion code {code}")))?;

        if let Some(max_uses) = code_row.max_uses {
            if code_row.times_used >= max_uses {
                return Err(ServiceError::ValidationError(format!(
                    "promotion code {code} is exhausted"
                )));
            }
        }

        let promotion = self.get(code_row.promotion_id).await?;
        if !promotion.is_active {
            return Err(ServiceError::ValidationError(format!(
                "promotion code {code} is inactive"
            )));
        }
        if promotion.starts_at > now {
            return Err(ServiceError::ValidationError(format!(
                "promotion code {code} is not active yet"
            )));
        }
        if let Some(ends_at) = promotion.ends_at {
            if ends_at < now {
                return Err(ServiceError::ValidationError(format!(
                    "promotion code {code} has expired"
                )));
            }
        }

        Ok((promotion, code_row))
    }

    /// Count one redemption of a validated code.
    #[instrument(skip(self))]
    pub async fn consume_code(&self, code_id: i64) -> Result<(), ServiceError> {
        let code = promotion_code::Entity::find_by_id(code_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Promotion code {code_id} not found")))?;
        let times_used = code.times_used + 1;
        let mut active: promotion_code::ActiveModel = code.into();
        active.times_used = Set(times_used);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        info!(code_id, times_used, "promotion code redeemed");
        Ok(())
    }
}

/// Discount for a given subtotal under a promotion, clamped to the subtotal.
pub fn discount_amount(promotion: &promotion::Model, subtotal: Decimal) -> Decimal {
    let raw = match promotion.discount_kind.as_str() {
        "percent" => subtotal * promotion.discount_value / Decimal::from(100),
        "fixed" => promotion.discount_value,
        _ => Decimal::ZERO,
    };
    raw.min(subtotal)
}

#[derive(Debug, Deserialize)]
pub struct CreatePromotionInput {
    pub name: String,
    pub description: Option<String>,
    pub discount_kind: String,
    pub discount_value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn promo(kind: &str, value: Decimal) -> promotion::Model {
        promotion::Model {
            id: 1,
            name: "Summer".into(),
            description: None,
            discount_kind: kind.into(),
            discount_value: value,
            starts_at: Utc::now(),
            ends_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn percent_discount_scales_with_subtotal() {
        let p = promo("percent", dec!(10));
        assert_eq!(discount_amount(&p, dec!(200.00)), dec!(20.00));
    }

    #[test]
    fn fixed_discount_is_clamped_to_subtotal() {
        let p = promo("fixed", dec!(50));
        assert_eq!(discount_amount(&p, dec!(30.00)), dec!(30.00));
        assert_eq!(discount_amount(&p, dec!(80.00)), dec!(50));
    }
}
