//! Bearer token verification tests
//!
//! Exercises `BearerValidator` in verify mode against a wiremock JWKS
//! endpoint, with tokens signed by the fixture RSA keys.

mod common;

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aadlogin::auth::BearerValidator;
use aadlogin::config::{BearerMode, Config};
use aadlogin::AuthError;

use common::{
    access_claims, config_for, jwks_body, now_secs, sign, JWKS_PATH, KID, ROGUE_KEY_PEM,
    SIGNING_KEY_PEM,
};

const AUDIENCE: &str = "api://test-client-id";

fn verify_config(server: &MockServer) -> Config {
    let mut config = config_for(&server.uri());
    config.bearer.mode = BearerMode::Verify;
    config.bearer.audience = Some(AUDIENCE.to_string());
    config.bearer.leeway_seconds = 0;
    config
}

fn issuer(server: &MockServer) -> String {
    format!("{}/test-tenant/v2.0", server.uri())
}

fn validator(config: &Config) -> BearerValidator {
    BearerValidator::from_config(config, Arc::new(reqwest::Client::new()))
}

async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_valid_token_is_accepted_with_claims() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let v = validator(&verify_config(&server));
    assert!(v.verifies());

    let token = sign(&access_claims(&issuer(&server), AUDIENCE), SIGNING_KEY_PEM, KID);
    let principal = v.validate(&token).await.expect("valid token accepted");

    assert_eq!(principal.token, token);
    let claims = principal.claims.expect("verified claims attached");
    assert_eq!(claims["sub"], "user-123");
    assert_eq!(claims["scp"], "access_as_user");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let mut claims = access_claims(&issuer(&server), AUDIENCE);
    let past = now_secs() - 7200;
    claims["iat"] = serde_json::json!(past);
    claims["nbf"] = serde_json::json!(past);
    claims["exp"] = serde_json::json!(past + 60);

    let token = sign(&claims, SIGNING_KEY_PEM, KID);
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_not_yet_valid_token_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let mut claims = access_claims(&issuer(&server), AUDIENCE);
    claims["nbf"] = serde_json::json!(now_secs() + 1800);

    let token = sign(&claims, SIGNING_KEY_PEM, KID);
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn test_wrong_issuer_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let token = sign(
        &access_claims("https://sts.windows.net/other-tenant/", AUDIENCE),
        SIGNING_KEY_PEM,
        KID,
    );
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let token = sign(
        &access_claims(&issuer(&server), "api://someone-else"),
        SIGNING_KEY_PEM,
        KID,
    );
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn test_foreign_signature_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    // Claims to be the published key but is signed by another one.
    let token = sign(&access_claims(&issuer(&server), AUDIENCE), ROGUE_KEY_PEM, KID);
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn test_unknown_kid_is_rejected() {
    let server = MockServer::start().await;
    mount_jwks(&server).await;

    let token = sign(
        &access_claims(&issuer(&server), AUDIENCE),
        SIGNING_KEY_PEM,
        "rotated-away",
    );
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("rotated-away"),
        "unexpected error: {}",
        err
    );
}

#[tokio::test]
async fn test_garbage_token_is_rejected_without_fetching_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = validator(&verify_config(&server))
        .validate("not-a-jwt")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)));

    server.verify().await;
}

#[tokio::test]
async fn test_signing_keys_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(1)
        .mount(&server)
        .await;

    let v = validator(&verify_config(&server));
    let token = sign(&access_claims(&issuer(&server), AUDIENCE), SIGNING_KEY_PEM, KID);

    for _ in 0..3 {
        assert!(v.validate(&token).await.is_ok());
    }

    server.verify().await;
}

#[tokio::test]
async fn test_withdrawn_key_rejected_after_cache_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})))
        .mount(&server)
        .await;

    let mut config = verify_config(&server);
    config.bearer.jwks_cache_seconds = 1;
    let v = validator(&config);
    let token = sign(&access_claims(&issuer(&server), AUDIENCE), SIGNING_KEY_PEM, KID);

    assert!(v.validate(&token).await.is_ok());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let err = v.validate(&token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unknown_kids_do_not_refetch_inside_refresh_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(1)
        .mount(&server)
        .await;

    let v = validator(&verify_config(&server));
    let claims = access_claims(&issuer(&server), AUDIENCE);

    for i in 0..20 {
        let token = sign(&claims, ROGUE_KEY_PEM, &format!("unknown-{i}"));
        let err = v.validate(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    // The published key is still served from the same fetch.
    let token = sign(&claims, SIGNING_KEY_PEM, KID);
    assert!(v.validate(&token).await.is_ok());

    server.verify().await;
}

#[tokio::test]
async fn test_unknown_kid_refetches_once_window_has_passed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = verify_config(&server);
    config.bearer.jwks_min_refresh_seconds = 0;
    let v = validator(&config);
    let claims = access_claims(&issuer(&server), AUDIENCE);

    assert!(v.validate(&sign(&claims, SIGNING_KEY_PEM, KID)).await.is_ok());
    assert!(v
        .validate(&sign(&claims, SIGNING_KEY_PEM, "newly-rotated"))
        .await
        .is_err());

    server.verify().await;
}

#[tokio::test]
async fn test_jwks_unavailable_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let token = sign(&access_claims(&issuer(&server), AUDIENCE), SIGNING_KEY_PEM, KID);
    let err = validator(&verify_config(&server))
        .validate(&token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)), "got {:?}", err);
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_explicit_issuer_and_jwks_uri_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = verify_config(&server);
    config.bearer.issuer = Some("https://issuer.example/".to_string());
    config.bearer.jwks_uri = Some(format!("{}/custom/keys", server.uri()));

    let token = sign(
        &access_claims("https://issuer.example/", AUDIENCE),
        SIGNING_KEY_PEM,
        KID,
    );
    assert!(validator(&config).validate(&token).await.is_ok());

    server.verify().await;
}

#[tokio::test]
async fn test_passthrough_accepts_any_token() {
    let v = BearerValidator::passthrough();
    assert!(!v.verifies());

    let principal = v.validate("anything-at-all").await.unwrap();
    assert_eq!(principal.token, "anything-at-all");
    assert!(principal.claims.is_none());

    assert_eq!(
        v.validate("").await.unwrap_err(),
        AuthError::MissingCredential
    );
}
