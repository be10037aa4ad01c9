//! Conformance tests for the shared list-endpoint contract: whitelisted
//! search and sort, permissive fallbacks, page-size clamping and
//! soft-delete visibility.

mod common;

use backoffice_api::db::list_query::ListParams;
use backoffice_api::services::catalog::ProductFilter;
use rust_decimal_macros::dec;

#[tokio::test]
async fn sort_token_orders_descending() {
    let ctx = common::setup().await;
    common::seed_product(&ctx, "SKU-A", "Anvil", dec!(10.00)).await;
    common::seed_product(&ctx, "SKU-B", "Bolt", dec!(30.00)).await;
    common::seed_product(&ctx, "SKU-C", "Clamp", dec!(20.00)).await;

    let params = ListParams {
        sort: Some("-price".into()),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();

    let prices: Vec<_> = page.items.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![dec!(30.00), dec!(20.00), dec!(10.00)]);

    let params = ListParams {
        sort: Some("price".into()),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    let prices: Vec<_> = page.items.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![dec!(10.00), dec!(20.00), dec!(30.00)]);
}

#[tokio::test]
async fn unknown_sort_token_falls_back_to_default_order() {
    let ctx = common::setup().await;
    common::seed_product(&ctx, "SKU-A", "Anvil", dec!(10.00)).await;
    common::seed_product(&ctx, "SKU-B", "Bolt", dec!(30.00)).await;

    let bogus = ListParams {
        sort: Some("danger; drop table".into()),
        ..Default::default()
    };
    let fallback = ctx
        .catalog
        .list_products(&bogus, ProductFilter::default())
        .await
        .unwrap();

    let default_params = ListParams::default();
    let default_page = ctx
        .catalog
        .list_products(&default_params, ProductFilter::default())
        .await
        .unwrap();

    let got: Vec<_> = fallback.items.iter().map(|p| p.sku.clone()).collect();
    let expected: Vec<_> = default_page.items.iter().map(|p| p.sku.clone()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn search_matches_whitelisted_columns_only() {
    let ctx = common::setup().await;
    common::seed_product(&ctx, "SKU-HAMMER", "Claw hammer", dec!(12.50)).await;
    common::seed_product(&ctx, "SKU-SAW", "Handsaw", dec!(19.90)).await;

    let params = ListParams {
        search: Some("hammer".into()),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].sku, "SKU-HAMMER");

    // "EUR" only appears in the currency column, which is not part of the
    // search whitelist, so nothing should match.
    let params = ListParams {
        search: Some("EUR".into()),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn per_page_is_clamped_to_bounds() {
    let ctx = common::setup().await;
    for i in 0..3 {
        common::seed_product(&ctx, &format!("SKU-{i}"), &format!("Product {i}"), dec!(5.00)).await;
    }

    let params = ListParams {
        per_page: Some(10_000),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(page.meta.per_page, 100);
    assert_eq!(page.meta.total, 3);

    let params = ListParams {
        per_page: Some(0),
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(page.meta.per_page, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.meta.total_pages, 3);
}

#[tokio::test]
async fn missing_record_maps_to_not_found() {
    let ctx = common::setup().await;
    let err = ctx.catalog.get_product(uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn soft_deleted_products_hide_from_default_listings() {
    let ctx = common::setup().await;
    let keep = common::seed_product(&ctx, "SKU-KEEP", "Keep", dec!(1.00)).await;
    let gone = common::seed_product(&ctx, "SKU-GONE", "Gone", dec!(2.00)).await;

    ctx.catalog.archive_product(gone.id).await.unwrap();

    let page = ctx
        .catalog
        .list_products(&ListParams::default(), ProductFilter::default())
        .await
        .unwrap();
    let skus: Vec<_> = page.items.iter().map(|p| p.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-KEEP"]);
    assert_eq!(page.items[0].id, keep.id);

    let params = ListParams {
        with_deleted: true,
        ..Default::default()
    };
    let page = ctx
        .catalog
        .list_products(&params, ProductFilter::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 2);
    let archived = page.items.iter().find(|p| p.id == gone.id).unwrap();
    assert!(archived.deleted_at.is_some());
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let ctx = common::setup().await;
    common::seed_product(&ctx, "SKU-DUP", "First", dec!(1.00)).await;

    let err = ctx
        .catalog
        .create_product(backoffice_api::services::catalog::CreateProductInput {
            sku: "SKU-DUP".into(),
            name: "Second".into(),
            description: None,
            brand_id: None,
            category_id: None,
            tax_rate_id: None,
            price: dec!(2.00),
            currency: "EUR".into(),
            stock_quantity: None,
            is_active: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn price_update_appends_history() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx, "SKU-PH", "Priced", dec!(10.00)).await;

    ctx.catalog
        .update_product(
            product.id,
            backoffice_api::services::catalog::UpdateProductInput {
                price: Some(dec!(12.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let history = ctx.catalog.list_price_history(product.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_price, dec!(10.00));
    assert_eq!(history[0].new_price, dec!(12.00));
}
