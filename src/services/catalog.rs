use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::{
    brand, category,
    category::CategoryTree,
    price_history, product, product_document, product_image, product_variant,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog service: products, variants, images, documents, brands,
/// categories and the price-history trail.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Columns matched by the free-text product search.
const PRODUCT_SEARCH: &[product::Column] =
    &[product::Column::Name, product::Column::Sku, product::Column::Description];

/// Columns clients may sort products by.
const PRODUCT_SORT: &[product::Column] = &[
    product::Column::Name,
    product::Column::Sku,
    product::Column::Price,
    product::Column::StockQuantity,
    product::Column::CreatedAt,
];

pub const PRODUCT_INCLUDES: &[&str] = &["variants", "images", "documents", "brand", "category"];
pub const PRODUCT_DEFAULT_INCLUDES: &[&str] = &["variants"];

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- products -------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        params: &ListParams,
        filter: ProductFilter,
    ) -> Result<Page<product::Model>, ServiceError> {
        let mut query = product::Entity::find();
        query = list_query::visible(query, product::Column::DeletedAt, params.with_deleted);
        query = list_query::apply_search(query, params.search(), PRODUCT_SEARCH);

        if let Some(brand_id) = filter.brand_id {
            query = query.filter(product::Column::BrandId.eq(brand_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(product::Column::IsActive.eq(is_active));
        }

        query = list_query::apply_sort(
            query,
            params.sort(),
            PRODUCT_SORT,
            product::Column::CreatedAt,
            Order::Desc,
        );

        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        self.ensure_unique_sku(&input.sku, None).await?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku),
            name: Set(input.name),
            description: Set(input.description),
            brand_id: Set(input.brand_id),
            category_id: Set(input.category_id),
            tax_rate_id: Set(input.tax_rate_id),
            price: Set(input.price),
            currency: Set(input.currency),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let product = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;
        info!(product_id = %product.id, "created product");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if let Some(ref sku) = input.sku {
            self.ensure_unique_sku(sku, Some(id)).await?;
        }

        let product = self.get_product(id).await?;
        let old_price = product.price;
        let mut active: product::ActiveModel = product.into();

        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(tax_rate_id) = input.tax_rate_id {
            active.tax_rate_id = Set(tax_rate_id);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));

        // Price changes go through the history trail in one transaction.
        if let Some(new_price) = input.price {
            if new_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".into(),
                ));
            }
            active.price = Set(new_price);

            let txn = self.db.begin().await?;
            let updated = active.update(&txn).await?;
            if new_price != old_price {
                price_history::ActiveModel {
                    product_id: Set(id),
                    variant_id: Set(None),
                    old_price: Set(old_price),
                    new_price: Set(new_price),
                    changed_by: Set(input.changed_by),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
            txn.commit().await?;

            if new_price != old_price {
                self.event_sender
                    .send_or_log(Event::ProductPriceChanged {
                        product_id: id,
                        old_price,
                        new_price,
                    })
                    .await;
            }
            self.event_sender.send_or_log(Event::ProductUpdated(id)).await;
            return Ok(updated);
        }

        let updated = active.update(&*self.db).await?;
        self.event_sender.send_or_log(Event::ProductUpdated(id)).await;
        Ok(updated)
    }

    /// Soft-delete a product. The row survives with `deleted_at` set.
    #[instrument(skip(self))]
    pub async fn archive_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(id).await?;
        if product.deleted_at.is_some() {
            return Ok(());
        }
        let mut active: product::ActiveModel = product.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        self.event_sender.send_or_log(Event::ProductArchived(id)).await;
        info!(product_id = %id, "archived product");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_price_history(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<price_history::Model>, ServiceError> {
        // Ensure the product exists so unknown ids 404 instead of listing empty.
        self.get_product(product_id).await?;
        price_history::Entity::find()
            .filter(price_history::Column::ProductId.eq(product_id))
            .order_by_desc(price_history::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    async fn ensure_unique_sku(
        &self,
        sku: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("SKU {sku} already exists")));
        }
        Ok(())
    }

    // ---- variants -------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_variant::Model>, ServiceError> {
        self.get_product(product_id).await?;
        product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Position)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn create_variant(
        &self,
        product_id: Uuid,
        input: CreateVariantInput,
    ) -> Result<product_variant::Model, ServiceError> {
        self.get_product(product_id).await?;

        let exists = product_variant::Entity::find()
            .filter(product_variant::Column::Sku.eq(input.sku.clone()))
            .one(&*self.db)
            .await?;
        if exists.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Variant SKU {} already exists",
                input.sku
            )));
        }

        let variant = product_variant::ActiveModel {
            product_id: Set(product_id),
            sku: Set(input.sku),
            name: Set(input.name),
            price: Set(input.price),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            position: Set(input.position.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(variant_id = variant.id, product_id = %product_id, "created variant");
        Ok(variant)
    }

    #[instrument(skip(self))]
    pub async fn get_variant(&self, id: i64) -> Result<product_variant::Model, ServiceError> {
        product_variant::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {id} not found")))
    }

    /// Update a variant's price, appending to the product's history trail.
    #[instrument(skip(self))]
    pub async fn update_variant_price(
        &self,
        id: i64,
        price: Decimal,
        changed_by: Option<Uuid>,
    ) -> Result<product_variant::Model, ServiceError> {
        if price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".into(),
            ));
        }

        let variant = self.get_variant(id).await?;
        let old_price = variant.price.unwrap_or(Decimal::ZERO);
        let product_id = variant.product_id;

        let mut active: product_variant::ActiveModel = variant.into();
        active.price = Set(Some(price));
        active.updated_at = Set(Some(Utc::now()));

        let txn = self.db.begin().await?;
        let updated = active.update(&txn).await?;
        price_history::ActiveModel {
            product_id: Set(product_id),
            variant_id: Set(Some(id)),
            old_price: Set(old_price),
            new_price: Set(price),
            changed_by: Set(changed_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_variant(&self, id: i64) -> Result<(), ServiceError> {
        let variant = self.get_variant(id).await?;
        product_variant::Entity::delete_by_id(variant.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    // ---- images & documents --------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        storage_key: String,
        alt_text: Option<String>,
        is_primary: bool,
    ) -> Result<product_image::Model, ServiceError> {
        self.get_product(product_id).await?;
        let position = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?
            .len() as i32;

        product_image::ActiveModel {
            product_id: Set(product_id),
            storage_key: Set(storage_key),
            alt_text: Set(alt_text),
            position: Set(position),
            is_primary: Set(is_primary),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_image::Model>, ServiceError> {
        self.get_product(product_id).await?;
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: i64) -> Result<product_image::Model, ServiceError> {
        let image = product_image::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {id} not found")))?;
        product_image::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(image)
    }

    #[instrument(skip(self))]
    pub async fn add_document(
        &self,
        product_id: Uuid,
        storage_key: String,
        title: String,
        mime_type: Option<String>,
    ) -> Result<product_document::Model, ServiceError> {
        self.get_product(product_id).await?;
        product_document::ActiveModel {
            product_id: Set(product_id),
            storage_key: Set(storage_key),
            title: Set(title),
            mime_type: Set(mime_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_documents(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_document::Model>, ServiceError> {
        self.get_product(product_id).await?;
        product_document::Entity::find()
            .filter(product_document::Column::ProductId.eq(product_id))
            .order_by_desc(product_document::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    // ---- brands ---------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_brands(&self, params: &ListParams) -> Result<Page<brand::Model>, ServiceError> {
        let mut query = brand::Entity::find();
        query = list_query::apply_search(
            query,
            params.search(),
            &[brand::Column::Name, brand::Column::Slug],
        );
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[brand::Column::Name, brand::Column::CreatedAt],
            brand::Column::Name,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_brand(&self, id: i64) -> Result<brand::Model, ServiceError> {
        brand::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_brand(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<brand::Model, ServiceError> {
        let slug = slugify(&name);
        brand::ActiveModel {
            name: Set(name),
            slug: Set(slug),
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

    #[instrument(skip(self))]
    pub async fn update_brand(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
        is_active: Option<bool>,
    ) -> Result<brand::Model, ServiceError> {
        let brand = self.get_brand(id).await?;
        let mut active: brand::ActiveModel = brand.into();
        if let Some(name) = name {
            active.slug = Set(slugify(&name));
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_brand(&self, id: i64) -> Result<(), ServiceError> {
        self.get_brand(id).await?;
        brand::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    // ---- categories -----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn category_tree(&self) -> Result<Vec<CategoryTree>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(CategoryTree::build(rows))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        params: &ListParams,
    ) -> Result<Page<category::Model>, ServiceError> {
        let mut query = category::Entity::find();
        query = list_query::apply_search(
            query,
            params.search(),
            &[category::Column::Name, category::Column::Slug],
        );
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[category::Column::Name, category::Column::Position],
            category::Column::Position,
            Order::Asc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i64) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        if let Some(parent_id) = input.parent_id {
            self.get_category(parent_id).await?;
        }
        category::ActiveModel {
            parent_id: Set(input.parent_id),
            slug: Set(slugify(&input.name)),
            name: Set(input.name),
            description: Set(input.description),
            position: Set(input.position.unwrap_or(0)),
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
    pub async fn update_category(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get_category(id).await?;

        if let Some(Some(parent_id)) = input.parent_id {
            if parent_id == id {
                return Err(ServiceError::ValidationError(
                    "a category cannot be its own parent".into(),
                ));
            }
            self.get_category(parent_id).await?;
        }

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.slug = Set(slugify(&name));
            active.name = Set(name);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<(), ServiceError> {
        self.get_category(id).await?;
        category::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }
}

/// Turn a display name into a URL slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductFilter {
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub tax_rate_id: Option<i64>,
    pub price: Decimal,
    pub currency: String,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    // Double options: outer = "field present", inner = the new value.
    pub brand_id: Option<Option<i64>>,
    pub category_id: Option<Option<i64>>,
    pub tax_rate_id: Option<Option<i64>>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    #[serde(skip)]
    pub changed_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantInput {
    pub sku: String,
    pub name: String,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub parent_id: Option<Option<i64>>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_flattens_punctuation_and_case() {
        assert_eq!(slugify("Garden & Outdoor"), "garden-outdoor");
        assert_eq!(slugify("  Déjà vu!  "), "d-j-vu");
        assert_eq!(slugify("Plain"), "plain");
    }

    #[test]
    fn product_filter_defaults_to_no_constraints() {
        let filter = ProductFilter::default();
        assert!(filter.brand_id.is_none());
        assert!(filter.category_id.is_none());
        assert!(filter.is_active.is_none());
    }
}
