//! Guest checkout and tracking: server-side price snapshots, promotion
//! codes, the status audit trail and the number+email tracking gate.

mod common;

use backoffice_api::services::promotions::CreatePromotionInput;
use backoffice_api::services::web_orders::{
    PlaceWebOrderInput, WebOrderItemInput, WebOrderStatus,
};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

fn checkout(items: Vec<WebOrderItemInput>, promo: Option<&str>) -> PlaceWebOrderInput {
    PlaceWebOrderInput {
        customer_name: "Ada Guest".into(),
        customer_email: "Ada@example.com".into(),
        customer_phone: None,
        shipping_address: "1 Infinite Loop, Cupertino".into(),
        currency: None,
        promotion_code: promo.map(str::to_string),
        notes: None,
        items,
    }
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_logs_history() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-WEB", "Web product", dec!(40.00)).await;

    let order = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 2,
            }],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(order.order_number, "WEB-000001");
    assert_eq!(order.subtotal, dec!(80.00));
    assert_eq!(order.total, dec!(80.00));
    assert_eq!(order.status, "received");
    // Email is normalized at checkout.
    assert_eq!(order.customer_email, "ada@example.com");

    let history = ctx.web_orders.history(order.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].new_status, "received");
}

#[tokio::test]
async fn promotion_codes_discount_and_count_usage() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-PROMO", "Discounted", dec!(100.00)).await;

    let promotion = ctx
        .promotions
        .create(CreatePromotionInput {
            name: "Launch".into(),
            description: None,
            discount_kind: "percent".into(),
            discount_value: dec!(10),
            starts_at: Utc::now() - Duration::days(1),
            ends_at: Some(Utc::now() + Duration::days(1)),
        })
        .await
        .unwrap();
    ctx.promotions
        .add_code(promotion.id, "launch10".into(), Some(1))
        .await
        .unwrap();

    let order = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            Some("LAUNCH10"),
        ))
        .await
        .unwrap();
    assert_eq!(order.discount_total, dec!(10.00));
    assert_eq!(order.total, dec!(90.00));

    // The single-use code is now exhausted.
    let err = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            Some("LAUNCH10"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tracking_requires_the_checkout_email() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-TRK", "Tracked", dec!(15.00)).await;

    let order = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            None,
        ))
        .await
        .unwrap();

    ctx.web_orders
        .change_status(order.id, WebOrderStatus::Processing, Some("picking".into()))
        .await
        .unwrap();

    let (tracked, history) = ctx
        .web_orders
        .track(&order.order_number, "ada@example.com")
        .await
        .unwrap();
    assert_eq!(tracked.status, "processing");
    assert_eq!(history.len(), 2);

    // A wrong email answers exactly like an unknown order.
    let err = ctx
        .web_orders
        .track(&order.order_number, "stranger@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inactive_products_cannot_be_ordered() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-OFF", "Retired", dec!(5.00)).await;
    ctx.catalog.archive_product(product.id).await.unwrap();

    let err = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            None,
        ))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_transitions_follow_the_fulfillment_chain() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-CHAIN", "Chained", dec!(5.00)).await;

    let order = ctx
        .web_orders
        .place(checkout(
            vec![WebOrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            None,
        ))
        .await
        .unwrap();

    // Shipping before processing is illegal.
    let err = ctx
        .web_orders
        .change_status(order.id, WebOrderStatus::Shipped, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    for (status, _) in [
        (WebOrderStatus::Processing, "processing"),
        (WebOrderStatus::Shipped, "shipped"),
        (WebOrderStatus::Delivered, "delivered"),
    ] {
        ctx.web_orders
            .change_status(order.id, status, None)
            .await
            .unwrap();
    }

    let history = ctx.web_orders.history(order.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.new_status.as_str()).collect();
    assert_eq!(
        statuses,
        vec!["received", "processing", "shipped", "delivered"]
    );
}
