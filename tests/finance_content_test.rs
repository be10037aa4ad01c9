//! Finance sweeps and content moderation.

mod common;

use backoffice_api::entities::finance::financial_transaction::{
    TransactionDirection, TransactionStatus,
};
use backoffice_api::services::content::{CreatePostInput, SubmitReviewInput};
use backoffice_api::services::finance::{CreateTransactionInput, TransactionFilter};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn transaction(label: &str, due_in_hours: i64) -> CreateTransactionInput {
    CreateTransactionInput {
        label: label.to_string(),
        direction: TransactionDirection::Out,
        amount: dec!(120.00),
        currency: "EUR".into(),
        invoice_id: None,
        client_id: None,
        provider_id: None,
        due_at: Some(Utc::now() + Duration::hours(due_in_hours)),
        notes: None,
    }
}

#[tokio::test]
async fn overdue_sweep_flips_only_planned_past_due_rows() {
    let ctx = common::setup().await;
    let stale = ctx.finance.create(transaction("Office rent", -2)).await.unwrap();
    let fresh = ctx.finance.create(transaction("Hosting", 48)).await.unwrap();
    let paid = ctx.finance.create(transaction("Cleaning", -5)).await.unwrap();
    ctx.finance.mark_paid(paid.id).await.unwrap();

    let flipped = ctx.finance.sweep_overdue(Utc::now()).await.unwrap();
    assert_eq!(flipped, 1);

    assert_eq!(ctx.finance.get(stale.id).await.unwrap().status, "overdue");
    assert_eq!(ctx.finance.get(fresh.id).await.unwrap().status, "planned");
    assert_eq!(ctx.finance.get(paid.id).await.unwrap().status, "paid");

    // Overdue rows can still be settled.
    let settled = ctx.finance.mark_paid(stale.id).await.unwrap();
    assert_eq!(settled.status, "paid");
    assert!(settled.paid_at.is_some());
}

#[tokio::test]
async fn reminders_dispatch_once() {
    let ctx = common::setup().await;
    let tx = ctx.finance.create(transaction("Insurance", 24)).await.unwrap();
    ctx.finance
        .add_reminder(tx.id, Utc::now() - Duration::hours(1), Some("call them".into()))
        .await
        .unwrap();
    ctx.finance
        .add_reminder(tx.id, Utc::now() + Duration::days(3), None)
        .await
        .unwrap();

    assert_eq!(ctx.finance.dispatch_due_reminders(Utc::now()).await.unwrap(), 1);
    // Nothing left to send on the second run.
    assert_eq!(ctx.finance.dispatch_due_reminders(Utc::now()).await.unwrap(), 0);

    let reminders = ctx.finance.list_reminders(tx.id).await.unwrap();
    assert_eq!(reminders.len(), 2);
    assert!(reminders[0].sent_at.is_some());
    assert!(reminders[1].sent_at.is_none());
}

#[tokio::test]
async fn direction_filter_narrows_listings() {
    let ctx = common::setup().await;
    ctx.finance.create(transaction("Out payment", 10)).await.unwrap();
    ctx.finance
        .create(CreateTransactionInput {
            direction: TransactionDirection::In,
            ..transaction("Incoming", 10)
        })
        .await
        .unwrap();

    let page = ctx
        .finance
        .list(
            &backoffice_api::db::list_query::ListParams::default(),
            TransactionFilter {
                direction: Some(TransactionDirection::In),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.items[0].direction, "in");
    assert_eq!(page.items[0].status, TransactionStatus::Planned.to_string());
}

#[tokio::test]
async fn blog_posts_publish_and_storefront_sees_published_only() {
    let ctx = common::setup().await;
    let post = ctx
        .content
        .create_post(CreatePostInput {
            title: "Spring catalog update".into(),
            slug: None,
            excerpt: None,
            body: "We added new things.".into(),
            banner_key: None,
            topics: Some(serde_json::json!(["catalog", "news"])),
            sources: None,
            author_user_id: None,
        })
        .await
        .unwrap();
    assert_eq!(post.slug, "spring-catalog-update");
    assert_eq!(post.status, "draft");

    // Drafts are invisible to the storefront lookup.
    let err = ctx
        .content
        .get_published_post("spring-catalog-update")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);

    let post = ctx.content.publish_post(post.id).await.unwrap();
    assert!(post.published_at.is_some());
    assert!(ctx
        .content
        .get_published_post("spring-catalog-update")
        .await
        .is_ok());
}

#[tokio::test]
async fn reviews_wait_for_moderation() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-REV", "Reviewed", dec!(30.00)).await;

    let review = ctx
        .content
        .submit_review(SubmitReviewInput {
            product_id: product.id,
            author_name: "Sam".into(),
            author_email: "sam@example.com".into(),
            rating: 5,
            body: Some("great".into()),
        })
        .await
        .unwrap();
    assert_eq!(review.status, "pending");

    let moderator = Uuid::new_v4();
    let review = ctx
        .content
        .moderate_review(review.id, true, moderator)
        .await
        .unwrap();
    assert_eq!(review.status, "approved");
    assert_eq!(review.moderated_by, Some(moderator));

    // Moderating twice is rejected.
    let err = ctx
        .content
        .moderate_review(review.id, false, moderator)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    // Out-of-range ratings are rejected up front.
    let err = ctx
        .content
        .submit_review(SubmitReviewInput {
            product_id: product.id,
            author_name: "Sam".into(),
            author_email: "sam@example.com".into(),
            rating: 6,
            body: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
}
