//! Restore of a session that holds a credential but no resolved user.
//!
//! The HTTP tests can't produce this session shape (login stores both
//! keys), so these tests drive the extractor directly with a hand-built
//! session, the way it would look after a storefront redeploy that kept
//! the cookie but lost nothing else.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::Request;
use serde_json::json;
use tower_sessions::{MemoryStore, Session};

use electro_core::AccessToken;
use electro_integration_tests::spawn_backend;
use electro_storefront::config::StorefrontConfig;
use electro_storefront::middleware::RequireAuth;
use electro_storefront::models::{CurrentUser, session_keys};
use electro_storefront::state::AppState;

fn app_state(backend_url: String) -> AppState {
    AppState::new(StorefrontConfig {
        backend_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        sentry_dsn: None,
    })
}

fn fresh_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

async fn parts_with(session: &Session) -> axum::http::request::Parts {
    let (parts, ()) = Request::builder()
        .uri("/")
        .extension(session.clone())
        .body(())
        .unwrap()
        .into_parts();
    parts
}

/// Register a user on the mock backend and return a valid token for them.
async fn issue_token(backend_url: &str) -> AccessToken {
    let client = reqwest::Client::new();
    client
        .post(format!("{backend_url}/register"))
        .json(&json!({
            "email": "restore@example.com",
            "password": "pw",
            "full_name": "Res Tore",
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .post(format!("{backend_url}/login"))
        .json(&json!({ "email": "restore@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    AccessToken::new(body["access_token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn token_only_session_is_restored_via_me() {
    let (backend_url, backend) = spawn_backend().await;
    let token = issue_token(&backend_url).await;

    let session = fresh_session();
    session
        .insert(session_keys::ACCESS_TOKEN, &token)
        .await
        .unwrap();

    let state = app_state(backend_url);
    let mut parts = parts_with(&session).await;

    let result = RequireAuth::from_request_parts(&mut parts, &state).await;

    assert!(result.is_ok());
    assert_eq!(backend.me_calls(), 1);

    // The resolved user is cached so the next request skips the lookup
    let user: Option<CurrentUser> = session.get(session_keys::CURRENT_USER).await.unwrap();
    assert_eq!(user.unwrap().full_name, "Res Tore");
}

#[tokio::test]
async fn restored_user_short_circuits_the_next_request() {
    let (backend_url, backend) = spawn_backend().await;
    let token = issue_token(&backend_url).await;

    let session = fresh_session();
    session
        .insert(session_keys::ACCESS_TOKEN, &token)
        .await
        .unwrap();

    let state = app_state(backend_url);

    let mut parts = parts_with(&session).await;
    RequireAuth::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .unwrap();

    let mut parts = parts_with(&session).await;
    RequireAuth::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .unwrap();

    assert_eq!(backend.me_calls(), 1);
}

#[tokio::test]
async fn invalid_token_is_discarded_on_failed_restore() {
    let (backend_url, backend) = spawn_backend().await;

    let session = fresh_session();
    session
        .insert(
            session_keys::ACCESS_TOKEN,
            &AccessToken::new("no-such-token".to_string()),
        )
        .await
        .unwrap();

    let state = app_state(backend_url);
    let mut parts = parts_with(&session).await;

    let result = RequireAuth::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
    assert_eq!(backend.me_calls(), 1);

    // The stale credential is gone; the next request never hits the backend
    let leftover: Option<AccessToken> = session.get(session_keys::ACCESS_TOKEN).await.unwrap();
    assert!(leftover.is_none());

    let mut parts = parts_with(&session).await;
    let result = RequireAuth::from_request_parts(&mut parts, &state).await;
    assert!(result.is_err());
    assert_eq!(backend.me_calls(), 1);
}

#[tokio::test]
async fn empty_session_is_rejected_without_backend_calls() {
    let (backend_url, backend) = spawn_backend().await;

    let state = app_state(backend_url);
    let session = fresh_session();
    let mut parts = parts_with(&session).await;

    let result = RequireAuth::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
    assert_eq!(backend.me_calls(), 0);
}
