//! Cross-aggregate commerce flows: quote conversion, invoicing from orders
//! and the stock-movement ledger's negative-stock guard.

mod common;

use backoffice_api::services::invoices::InvoiceStatus;
use backoffice_api::services::orders::{CreateOrderInput, OrderLineInput, OrderStatus};
use backoffice_api::services::quotes::{CreateQuoteInput, QuoteLineInput, QuoteStatus};
use backoffice_api::services::stock::RecordMovementInput;
use rust_decimal_macros::dec;

#[tokio::test]
async fn accepted_quotes_convert_into_orders_exactly_once() {
    let ctx = common::setup().await;
    let client = common::seed_client(&ctx, "Acme Works").await;
    let product = common::seed_product(&ctx, "SKU-Q", "Quoted product", dec!(50.00)).await;

    let quote = ctx
        .quotes
        .create(CreateQuoteInput {
            client_id: client.id,
            currency: "EUR".into(),
            valid_until: None,
            notes: None,
            items: vec![QuoteLineInput {
                product_id: product.id,
                variant_id: None,
                quantity: 3,
                unit_price: None,
                tax_rate: Some(dec!(20)),
            }],
        })
        .await
        .unwrap();
    assert_eq!(quote.quote_number, "QTE-000001");
    assert_eq!(quote.subtotal, dec!(150.00));
    assert_eq!(quote.tax_total, dec!(30.00));
    assert_eq!(quote.total, dec!(180.00));

    // Draft quotes do not convert.
    let err = ctx.quotes.convert_to_order(quote.id).await.unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    ctx.quotes
        .change_status(quote.id, QuoteStatus::Sent)
        .await
        .unwrap();
    ctx.quotes
        .change_status(quote.id, QuoteStatus::Accepted)
        .await
        .unwrap();

    let order = ctx.quotes.convert_to_order(quote.id).await.unwrap();
    assert_eq!(order.status, "confirmed");
    assert_eq!(order.total, quote.total);

    let items = ctx.orders.get_items(order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].unit_price, dec!(50.00));

    let quote = ctx.quotes.get(quote.id).await.unwrap();
    assert_eq!(quote.status, "converted");
    assert_eq!(quote.converted_order_id, Some(order.id));

    // Converting a second time is a conflict.
    let err = ctx.quotes.convert_to_order(quote.id).await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn invoices_mirror_their_order_and_track_payment() {
    let ctx = common::setup().await;
    let client = common::seed_client(&ctx, "Globex").await;
    let product = common::seed_product(&ctx, "SKU-I", "Invoiced product", dec!(25.00)).await;

    let order = ctx
        .orders
        .create(CreateOrderInput {
            client_id: client.id,
            currency: "EUR".into(),
            notes: None,
            items: vec![OrderLineInput {
                product_id: product.id,
                variant_id: None,
                quantity: 4,
                unit_price: None,
                tax_rate: Some(dec!(10)),
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.order_number, "ORD-000001");
    assert_eq!(order.total, dec!(110.00));

    let invoice = ctx.invoices.create_from_order(order.id, None).await.unwrap();
    assert_eq!(invoice.invoice_number, "INV-000001");
    assert_eq!(invoice.order_id, Some(order.id));
    assert_eq!(invoice.total, order.total);
    assert_eq!(invoice.status, "draft");

    let invoice = ctx
        .invoices
        .change_status(invoice.id, InvoiceStatus::Issued)
        .await
        .unwrap();
    assert!(invoice.issued_at.is_some());

    let invoice = ctx
        .invoices
        .change_status(invoice.id, InvoiceStatus::Paid)
        .await
        .unwrap();
    assert!(invoice.paid_at.is_some());

    // Paid invoices cannot be cancelled.
    let err = ctx
        .invoices
        .change_status(invoice.id, InvoiceStatus::Cancelled)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn order_status_transitions_are_guarded() {
    let ctx = common::setup().await;
    let client = common::seed_client(&ctx, "Initech").await;
    let product = common::seed_product(&ctx, "SKU-O", "Ordered", dec!(9.99)).await;

    let order = ctx
        .orders
        .create(CreateOrderInput {
            client_id: client.id,
            currency: "EUR".into(),
            notes: None,
            items: vec![OrderLineInput {
                product_id: product.id,
                variant_id: None,
                quantity: 1,
                unit_price: None,
                tax_rate: None,
            }],
        })
        .await
        .unwrap();

    // Draft cannot jump straight to fulfilled.
    let err = ctx
        .orders
        .change_status(order.id, OrderStatus::Fulfilled)
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    ctx.orders
        .change_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    let order = ctx
        .orders
        .change_status(order.id, OrderStatus::Fulfilled)
        .await
        .unwrap();
    assert_eq!(order.status, "fulfilled");
}

#[tokio::test]
async fn stock_movements_apply_deltas_and_refuse_negative_stock() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-S", "Stocked", dec!(7.00)).await;
    let reason = ctx
        .stock
        .create_reason("Delivery".into(), None)
        .await
        .unwrap();

    ctx.stock
        .record_movement(RecordMovementInput {
            product_id: product.id,
            variant_id: None,
            reason_id: reason.id,
            provider_id: None,
            quantity: 10,
            note: None,
            moved_at: None,
            created_by: None,
        })
        .await
        .unwrap();

    let product_after = ctx.catalog.get_product(product.id).await.unwrap();
    assert_eq!(product_after.stock_quantity, 10);

    // Issuing more than on hand fails and writes nothing.
    let err = ctx
        .stock
        .record_movement(RecordMovementInput {
            product_id: product.id,
            variant_id: None,
            reason_id: reason.id,
            provider_id: None,
            quantity: -11,
            note: None,
            moved_at: None,
            created_by: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );

    let product_after = ctx.catalog.get_product(product.id).await.unwrap();
    assert_eq!(product_after.stock_quantity, 10);

    let page = ctx
        .stock
        .list_movements(
            &backoffice_api::db::list_query::ListParams::default(),
            backoffice_api::services::stock::MovementFilter {
                product_id: Some(product.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
}
