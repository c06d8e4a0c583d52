//! Cart mutations and server-truth rendering.

#![allow(clippy::unwrap_used)]

use electro_integration_tests::TestContext;

const EMAIL: &str = "cart@example.com";

async fn logged_in_ctx() -> TestContext {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login(EMAIL, "pw", "Carl Carter").await;
    ctx
}

/// Submit the add-to-cart form the catalog page renders.
async fn add(ctx: &TestContext, product_name: &str, quantity: u32) {
    let product_id = ctx.backend.product_id(product_name);
    let response = ctx
        .client
        .post(ctx.url("/cart/add"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", &quantity.to_string()),
            ("next", "/cart"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn cart_total_sums_price_times_quantity() {
    let ctx = logged_in_ctx().await;

    // 2 x $10.00 + 1 x $3.50
    add(&ctx, "Desk Phone Stand", 2).await;
    add(&ctx, "USB-C Cable 2m", 1).await;

    let body = ctx.page("/cart").await;

    assert!(body.contains("Total: $23.50"));
    assert!(body.contains("$20.00")); // stand line total
    assert!(body.contains("$3.50"));
}

#[tokio::test]
async fn adding_the_same_product_merges_lines() {
    let ctx = logged_in_ctx().await;

    add(&ctx, "Desk Phone Stand", 1).await;
    add(&ctx, "Desk Phone Stand", 1).await;

    assert_eq!(
        ctx.backend.cart_of(EMAIL),
        vec![("Desk Phone Stand".to_string(), 2)]
    );
}

#[tokio::test]
async fn zero_quantity_update_is_clamped_to_one() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "USB-C Cable 2m", 1).await;
    let item_id = ctx.backend.line_id(EMAIL, "USB-C Cable 2m");

    // The mock backend rejects quantity=0 outright; this only succeeds if
    // the storefront clamps the decrement before it reaches the wire.
    let response = ctx
        .client
        .post(ctx.url("/cart/update"))
        .form(&[("item_id", item_id.as_str()), ("quantity", "0")])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        ctx.backend.cart_of(EMAIL),
        vec![("USB-C Cable 2m".to_string(), 1)]
    );
}

#[tokio::test]
async fn updating_quantity_changes_the_line() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "Desk Phone Stand", 1).await;
    let item_id = ctx.backend.line_id(EMAIL, "Desk Phone Stand");

    let body = ctx
        .client
        .post(ctx.url("/cart/update"))
        .form(&[("item_id", item_id.as_str()), ("quantity", "4")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Total: $40.00"));
}

#[tokio::test]
async fn removing_a_line_leaves_the_rest() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "Desk Phone Stand", 1).await;
    add(&ctx, "USB-C Cable 2m", 1).await;
    let item_id = ctx.backend.line_id(EMAIL, "Desk Phone Stand");

    let body = ctx
        .client
        .post(ctx.url("/cart/remove"))
        .form(&[("item_id", item_id.as_str())])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains("Desk Phone Stand"));
    assert!(body.contains("USB-C Cable 2m"));
}

#[tokio::test]
async fn clearing_empties_the_cart() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "Desk Phone Stand", 3).await;

    let body = ctx
        .client
        .post(ctx.url("/cart/clear"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Your cart is empty"));
    assert_eq!(ctx.backend.cart_of(EMAIL), Vec::new());
}

#[tokio::test]
async fn cart_page_shows_server_state_not_client_state() {
    let ctx = logged_in_ctx().await;

    // A line added behind the storefront's back still shows up, because
    // the page is always rendered from a fresh fetch.
    ctx.backend.push_cart_line(EMAIL, "AeroBook 14 Laptop", 1);

    let body = ctx.page("/cart").await;
    assert!(body.contains("AeroBook 14 Laptop"));
}

#[tokio::test]
async fn cart_page_degrades_when_fetch_fails() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "Desk Phone Stand", 1).await;

    ctx.backend.set_fail_cart(true);

    let response = ctx.raw.get(ctx.url("/cart")).send().await.unwrap();
    assert!(response.status().is_success());

    // The notice must not read like an empty cart; the backend still
    // holds the line.
    let body = response.text().await.unwrap();
    assert!(body.contains("Your cart is unavailable right now"));
    assert!(!body.contains("Your cart is empty"));

    ctx.backend.set_fail_cart(false);
    let body = ctx.page("/cart").await;
    assert!(body.contains("Desk Phone Stand"));
}

#[tokio::test]
async fn header_badge_counts_units_across_lines() {
    let ctx = logged_in_ctx().await;
    add(&ctx, "Desk Phone Stand", 2).await;
    add(&ctx, "USB-C Cable 2m", 1).await;

    let body = ctx.page("/").await;
    assert!(body.contains("Cart (3)"));
}

#[tokio::test]
async fn add_returns_to_the_requested_page() {
    let ctx = logged_in_ctx().await;
    let product_id = ctx.backend.product_id("USB-C Cable 2m");

    let response = ctx
        .raw
        .post(ctx.url("/cart/add"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", "1"),
            ("next", "/?search=cable"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok()),
        Some("/?search=cable")
    );
}
