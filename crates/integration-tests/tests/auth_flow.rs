//! Session and authentication lifecycle over HTTP.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use electro_integration_tests::TestContext;

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn fresh_session_redirects_to_login_without_backend_calls() {
    let ctx = TestContext::spawn().await;

    let response = ctx.raw.get(ctx.url("/")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(ctx.backend.me_calls(), 0);
}

#[tokio::test]
async fn register_signs_in_and_lands_on_catalog() {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login("ada@example.com", "correct-horse", "Ada Lovelace")
        .await;

    let body = ctx.page("/").await;

    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("Nova X5 Smartphone"));
}

#[tokio::test]
async fn duplicate_registration_shows_error() {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login("dup@example.com", "pw-one", "First User")
        .await;

    // Log out first; the registration form bounces authenticated visitors
    ctx.client
        .post(ctx.url("/auth/logout"))
        .send()
        .await
        .unwrap();

    let body = ctx
        .client
        .post(ctx.url("/auth/register"))
        .form(&[
            ("full_name", "Second User"),
            ("email", "dup@example.com"),
            ("password", "pw-two"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Could not create the account"));
}

#[tokio::test]
async fn bad_credentials_redirect_back_with_error_code() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .raw
        .post(ctx.url("/auth/login"))
        .form(&[("email", "nobody@example.com"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?error=credentials");
}

#[tokio::test]
async fn login_page_bounces_authenticated_visitors() {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login("back@example.com", "pw", "Back Again")
        .await;

    let response = ctx.raw.get(ctx.url("/auth/login")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login("leaver@example.com", "pw", "Lee Ver")
        .await;

    let response = ctx.raw.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(location(&response), "/auth/login");

    // No credential left behind: the next page load redirects without
    // touching the backend.
    let calls_before = ctx.backend.me_calls();
    let response = ctx.raw.get(ctx.url("/")).send().await.unwrap();
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(ctx.backend.me_calls(), calls_before);
}

#[tokio::test]
async fn revoked_token_bounces_to_login_mid_session() {
    let ctx = TestContext::spawn().await;
    ctx.register_and_login("revoked@example.com", "pw", "Rev Oked")
        .await;

    ctx.backend.revoke_tokens();

    let response = ctx.raw.get(ctx.url("/cart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}
