//! Integration tests for the bearer token lifecycle.
//!
//! These tests verify that the Authorizer:
//! - Acquires exactly once before the first authenticated request
//! - Probes the held token and keeps it while the API accepts it
//! - Refreshes on 401 when a refresh token is held, re-acquires otherwise
//! - Discards or retains the refresh token according to its policy
//! - Reports token endpoint failures as authentication errors

use std::sync::Arc;
use std::time::Duration;

use mcommunity_core::{
    ApiBase, ApiError, AuthHeaderProvider, Authorizer, Credentials, RefreshTokenPolicy,
    TokenState,
};
use reqwest::Client;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Helper to build an authorizer against the mock server.
fn authorizer(server: &MockServer, policy: RefreshTokenPolicy) -> Authorizer {
    let base = ApiBase::parse(&server.uri()).unwrap();
    Authorizer::new(Client::new(), base, Credentials::new("X", "Y"))
        .with_refresh_token_policy(policy)
}

async fn mount_token(server: &MockServer, access: &str, refresh: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/token/"))
        .and(body_json(json!({"username": "X", "password": "Y"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": access, "refresh": refresh})),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_probe(server: &MockServer, access: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/groups/"))
        .and(header("authorization", format!("Bearer {}", access).as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_call_acquires_once() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;

    // No probe before the first acquisition.
    Mock::given(method("GET"))
        .and(path("/groups/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    assert_eq!(auth.state().await, TokenState::NoToken);

    let header = auth.get_auth_header().await.unwrap();
    assert_eq!(header.key(), "Authorization");
    assert_eq!(header.value(), "Bearer abc123");
    assert_eq!(auth.state().await, TokenState::Valid);

    let pair = auth.token_pair().await.unwrap();
    assert!(!pair.access_token.is_empty());
    assert_eq!(pair.access_token.expose(), "abc123");
    assert_eq!(pair.refresh_token.unwrap().expose(), "r1");
}

#[tokio::test]
async fn test_valid_token_is_kept() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 200).await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    auth.get_auth_header().await.unwrap();

    let header = auth.get_auth_header().await.unwrap();
    assert_eq!(header.value(), "Bearer abc123");
    assert_eq!(auth.state().await, TokenState::Valid);
}

#[tokio::test]
async fn test_expired_token_refreshes_and_discards_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 401).await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer abc123");

    let header = auth.get_auth_header().await.unwrap();
    assert_eq!(header.value(), "Bearer a2");
    assert_eq!(auth.state().await, TokenState::Valid);

    // Observed behavior: the refresh token is cleared after one use.
    let pair = auth.token_pair().await.unwrap();
    assert!(pair.refresh_token.is_none());
}

#[tokio::test]
async fn test_expired_token_refreshes_and_retains_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 401).await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Retain);
    auth.get_auth_header().await.unwrap();

    let header = auth.get_auth_header().await.unwrap();
    assert_eq!(header.value(), "Bearer a2");

    let pair = auth.token_pair().await.unwrap();
    assert_eq!(pair.refresh_token.unwrap().expose(), "r1");
}

#[tokio::test]
async fn test_retain_uses_rotated_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 401).await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Retain);
    auth.get_auth_header().await.unwrap();
    auth.get_auth_header().await.unwrap();

    let pair = auth.token_pair().await.unwrap();
    assert_eq!(pair.refresh_token.unwrap().expose(), "r2");
}

#[tokio::test]
async fn test_expired_without_refresh_token_reacquires() {
    let server = MockServer::start().await;

    // First acquisition hands out a1/r1, the second a3/r3.
    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a3", "refresh": "r3"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    mount_probe(&server, "a1", 401).await;
    mount_probe(&server, "a2", 401).await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer a1");

    // Refresh consumes r1.
    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer a2");

    // No refresh token left, so a full acquisition follows.
    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer a3");
    let pair = auth.token_pair().await.unwrap();
    assert_eq!(pair.refresh_token.unwrap().expose(), "r3");
}

#[tokio::test]
async fn test_token_endpoint_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    let result = auth.get_auth_header().await;

    match result {
        Err(ApiError::Authentication { message }) => {
            assert!(message.contains("No active account"));
        }
        other => panic!("Expected ApiError::Authentication, got {:?}", other),
    }
    assert_eq!(auth.state().await, TokenState::NoToken);
}

#[tokio::test]
async fn test_refresh_rejection_is_authentication_failure() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 401).await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired"
        })))
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    auth.get_auth_header().await.unwrap();

    let result = auth.get_auth_header().await;
    assert!(matches!(result, Err(ApiError::Authentication { .. })));
    assert_eq!(auth.state().await, TokenState::Expired);
}

#[tokio::test]
async fn test_rejected_refresh_token_is_dropped_and_next_call_reacquires() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_probe(&server, "a1", 401).await;

    // The dead refresh token is sent exactly once.
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Retain);
    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer a1");

    let result = auth.get_auth_header().await;
    assert!(matches!(result, Err(ApiError::Authentication { .. })));
    assert_eq!(auth.state().await, TokenState::Expired);
    assert!(auth.token_pair().await.unwrap().refresh_token.is_none());

    assert_eq!(auth.get_auth_header().await.unwrap().value(), "Bearer a2");
    assert_eq!(auth.state().await, TokenState::Valid);
    let pair = auth.token_pair().await.unwrap();
    assert_eq!(pair.refresh_token.unwrap().expose(), "r2");
}

#[tokio::test]
async fn test_probe_transport_failure_keeps_held_tokens() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;

    // The probe answers only after the client has given up.
    Mock::given(method("GET"))
        .and(path("/groups/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let http = Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let base = ApiBase::parse(&server.uri()).unwrap();
    let auth = Authorizer::new(http, base, Credentials::new("X", "Y"));

    auth.get_auth_header().await.unwrap();

    let result = auth.get_auth_header().await;
    assert!(matches!(result, Err(ApiError::Transport { .. })));

    assert_eq!(auth.state().await, TokenState::Valid);
    let pair = auth.token_pair().await.unwrap();
    assert_eq!(pair.access_token.expose(), "abc123");
    assert_eq!(pair.refresh_token.unwrap().expose(), "r1");
}

#[tokio::test]
async fn test_empty_access_token_is_rejected() {
    let server = MockServer::start().await;
    mount_token(&server, "", "r1", 1).await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    assert!(matches!(
        auth.get_auth_header().await,
        Err(ApiError::Authentication { .. })
    ));
}

#[tokio::test]
async fn test_malformed_token_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    assert!(matches!(
        auth.get_auth_header().await,
        Err(ApiError::Authentication { .. })
    ));
}

#[tokio::test]
async fn test_invalidate_forces_reacquisition() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 2).await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard);
    auth.get_auth_header().await.unwrap();

    auth.invalidate().await;
    assert_eq!(auth.state().await, TokenState::NoToken);

    auth.get_auth_header().await.unwrap();
    assert_eq!(auth.state().await, TokenState::Valid);
}

#[tokio::test]
async fn test_concurrent_callers_acquire_once() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;
    mount_probe(&server, "abc123", 200).await;

    let auth = Arc::new(authorizer(&server, RefreshTokenPolicy::Discard));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move { auth.get_auth_header().await })
        })
        .collect();

    for handle in handles {
        let header = handle.await.unwrap().unwrap();
        assert_eq!(header.value(), "Bearer abc123");
    }
}

#[tokio::test]
async fn test_custom_probe_path() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123", "r1", 1).await;

    Mock::given(method("GET"))
        .and(path("/people/me/"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let auth = authorizer(&server, RefreshTokenPolicy::Discard).with_probe_path("people/me/");
    auth.get_auth_header().await.unwrap();
    auth.get_auth_header().await.unwrap();
}
