//! Tests for the auth module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_auth(server: &MockServer, cache: TokenCachePolicy) -> Authenticator {
    Authenticator::new(AuthConfig::Login {
        login_url: format!("{}/nikola-auth/tokens/login", server.uri()),
        credentials: Credentials::new("user", "secret"),
        cache,
    })
}

#[tokio::test]
async fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let headers = auth.auth_header().await.unwrap();
    assert!(headers.is_empty());
}

#[tokio::test]
async fn test_bearer_auth() {
    let auth = Authenticator::new(AuthConfig::Bearer {
        token: "my-bearer-token".to_string(),
    });

    let headers = auth.auth_header().await.unwrap();
    assert_eq!(
        headers.get("Authorization"),
        Some(&"Bearer my-bearer-token".to_string())
    );
}

#[tokio::test]
async fn test_successful_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nikola-auth/tokens/login"))
        .and(query_param("username", "user"))
        .and(query_param("password", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("valid_token\n"))
        .expect(1)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Disabled);
    let headers = auth.auth_header().await.unwrap();

    assert_eq!(
        headers.get("Authorization"),
        Some(&"Bearer valid_token".to_string())
    );
}

#[tokio::test]
async fn test_unauthorized_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nikola-auth/tokens/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Disabled);
    let err = auth.auth_header().await.unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("Error: 401"));
}

#[tokio::test]
async fn test_login_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nikola-auth/tokens/login"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Disabled);
    let err = auth.auth_header().await.unwrap_err();

    assert!(err.to_string().contains("Error: 500"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_empty_token_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Disabled);
    assert!(matches!(
        auth.auth_header().await,
        Err(Error::Auth { .. })
    ));
}

#[tokio::test]
async fn test_cache_disabled_logs_in_every_time() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("token"))
        .expect(3)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Disabled);
    for _ in 0..3 {
        auth.auth_header().await.unwrap();
    }
}

#[tokio::test]
async fn test_cache_ttl_reuses_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("token"))
        .expect(1)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Ttl(Duration::from_secs(3600)));
    for _ in 0..3 {
        assert_eq!(auth.token().await.unwrap(), "token");
    }
}

#[tokio::test]
async fn test_clear_cache_forces_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("token"))
        .expect(2)
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Forever);
    auth.token().await.unwrap();
    auth.token().await.unwrap();
    auth.clear_cache().await;
    auth.token().await.unwrap();
}

#[tokio::test]
async fn test_failed_login_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second"))
        .mount(&server)
        .await;

    let auth = login_auth(&server, TokenCachePolicy::Forever);
    assert!(auth.token().await.is_err());
    assert_eq!(auth.token().await.unwrap(), "second");
}
