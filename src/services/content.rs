use crate::db::list_query::{self, ListParams, Page};
use crate::entities::catalog::product;
use crate::entities::content::{
    blog_post,
    product_review,
    product_review::ReviewStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::slugify;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Content service: the blog and storefront product reviews (with
/// moderation).
#[derive(Clone)]
pub struct ContentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

const POST_SEARCH: &[blog_post::Column] = &[
    blog_post::Column::Title,
    blog_post::Column::Slug,
    blog_post::Column::Excerpt,
];

const POST_SORT: &[blog_post::Column] = &[
    blog_post::Column::Title,
    blog_post::Column::PublishedAt,
    blog_post::Column::CreatedAt,
];

impl ContentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- blog posts -----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        params: &ListParams,
        published_only: bool,
    ) -> Result<Page<blog_post::Model>, ServiceError> {
        let mut query = blog_post::Entity::find();
        query = list_query::apply_search(query, params.search(), POST_SEARCH);
        if published_only {
            query = query.filter(blog_post::Column::Status.eq("published"));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            POST_SORT,
            blog_post::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_post(&self, id: Uuid) -> Result<blog_post::Model, ServiceError> {
        blog_post::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Blog post {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<blog_post::Model, ServiceError> {
        blog_post::Entity::find()
            .filter(blog_post::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Blog post '{slug}' not found")))
    }

    /// Published post for the storefront; drafts 404 there.
    #[instrument(skip(self))]
    pub async fn get_published_post(&self, slug: &str) -> Result<blog_post::Model, ServiceError> {
        let post = self.get_post_by_slug(slug).await?;
        if post.status != "published" {
            return Err(ServiceError::NotFound(format!("Blog post '{slug}' not found")));
        }
        Ok(post)
    }

    #[instrument(skip(self, input))]
    pub async fn create_post(&self, input: CreatePostInput) -> Result<blog_post::Model, ServiceError> {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.title));
        let now = Utc::now();
        blog_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug),
            title: Set(input.title),
            excerpt: Set(input.excerpt),
            body: Set(input.body),
            banner_key: Set(input.banner_key),
            topics: Set(input.topics.unwrap_or_else(|| serde_json::json!([]))),
            sources: Set(input.sources.unwrap_or_else(|| serde_json::json!([]))),
            status: Set("draft".to_string()),
            published_at: Set(None),
            author_user_id: Set(input.author_user_id),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_post(
        &self,
        id: Uuid,
        input: UpdatePostInput,
    ) -> Result<blog_post::Model, ServiceError> {
        let existing = self.get_post(id).await?;
        let mut active: blog_post::ActiveModel = existing.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(excerpt) = input.excerpt {
            active.excerpt = Set(Some(excerpt));
        }
        if let Some(body) = input.body {
            active.body = Set(body);
        }
        if let Some(banner_key) = input.banner_key {
            active.banner_key = Set(Some(banner_key));
        }
        if let Some(topics) = input.topics {
            active.topics = Set(topics);
        }
        if let Some(sources) = input.sources {
            active.sources = Set(sources);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn publish_post(&self, id: Uuid) -> Result<blog_post::Model, ServiceError> {
        let existing = self.get_post(id).await?;
        if existing.status == "published" {
            return Ok(existing);
        }
        let mut active: blog_post::ActiveModel = existing.into();
        active.status = Set("published".to_string());
        active.published_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::BlogPostPublished(id))
            .await;
        info!(post_id = %id, "published blog post");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn unpublish_post(&self, id: Uuid) -> Result<blog_post::Model, ServiceError> {
        let existing = self.get_post(id).await?;
        let mut active: blog_post::ActiveModel = existing.into();
        active.status = Set("draft".to_string());
        active.published_at = Set(None);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get_post(id).await?;
        blog_post::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    // ---- product reviews ------------------------------------------------

    /// Storefront submission; reviews wait in `pending` until moderated.
    #[instrument(skip(self, input))]
    pub async fn submit_review(
        &self,
        input: SubmitReviewInput,
    ) -> Result<product_review::Model, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "rating must be between 1 and 5".into(),
            ));
        }
        product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        product_review::ActiveModel {
            product_id: Set(input.product_id),
            author_name: Set(input.author_name),
            author_email: Set(input.author_email),
            rating: Set(input.rating),
            body: Set(input.body),
            status: Set(ReviewStatus::Pending.to_string()),
            moderated_by: Set(None),
            moderated_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_reviews(
        &self,
        params: &ListParams,
        product_id: Option<Uuid>,
        status: Option<ReviewStatus>,
    ) -> Result<Page<product_review::Model>, ServiceError> {
        let mut query = product_review::Entity::find();
        if let Some(product_id) = product_id {
            query = query.filter(product_review::Column::ProductId.eq(product_id));
        }
        if let Some(status) = status {
            query = query.filter(product_review::Column::Status.eq(status.as_ref()));
        }
        query = list_query::apply_sort(
            query,
            params.sort(),
            &[product_review::Column::Rating, product_review::Column::CreatedAt],
            product_review::Column::CreatedAt,
            Order::Desc,
        );
        list_query::paginate(&self.db, query, params.page(), params.per_page())
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn moderate_review(
        &self,
        id: i64,
        approve: bool,
        moderator: Uuid,
    ) -> Result<product_review::Model, ServiceError> {
        let review = product_review::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {id} not found")))?;

        if review.status != ReviewStatus::Pending.to_string() {
            return Err(ServiceError::InvalidTransition(format!(
                "review {id} was already moderated"
            )));
        }

        let status = if approve {
            ReviewStatus::Approved
        } else {
            ReviewStatus::Rejected
        };
        let mut active: product_review::ActiveModel = review.into();
        active.status = Set(status.to_string());
        active.moderated_by = Set(Some(moderator));
        active.moderated_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewModerated {
                review_id: id,
                status: status.to_string(),
            })
            .await;
        Ok(updated)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: String,
    pub banner_key: Option<String>,
    pub topics: Option<serde_json::Value>,
    pub sources: Option<serde_json::Value>,
    pub author_user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub banner_key: Option<String>,
    pub topics: Option<serde_json::Value>,
    pub sources: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewInput {
    /// Taken from the URL on the storefront route; defaults to nil there.
    #[serde(default = "Uuid::nil")]
    pub product_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub rating: i32,
    pub body: Option<String>,
}
