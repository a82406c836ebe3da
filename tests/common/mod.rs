//! Shared helpers for integration tests
//!
//! Every helper builds configuration pointing at a wiremock server that
//! plays the identity provider, using tenant [`TENANT`].

use std::time::{SystemTime, UNIX_EPOCH};

use aadlogin::config::{Config, IdentityConfig};
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

pub const TENANT: &str = "test-tenant";
pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const REDIRECT_URI: &str = "http://localhost:8000/auth/callback";
pub const TOKEN_PATH: &str = "/test-tenant/oauth2/v2.0/token";
pub const JWKS_PATH: &str = "/test-tenant/discovery/v2.0/keys";

/// Key id under which [`SIGNING_KEY_PEM`] is published.
pub const KID: &str = "test-key-1";

/// RSA key whose public half is served by [`jwks_body`].
pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");

/// RSA key unknown to the provider.
#[allow(dead_code)]
pub const ROGUE_KEY_PEM: &str = include_str!("../fixtures/rogue_key.pem");

/// Base64url modulus of [`SIGNING_KEY_PEM`].
const SIGNING_KEY_N: &str = "5_wb0CK0qtqDlUN3T3YP9y_O0rNV2EjcP_YeX4Ul9GmftyILyxSKJI2KRo-BYiPW6qXyzuNrj9KF_Q27B2a68CpyuWeRDnu9dEuO0nPbG9QCvmb2K4MSJntPDFz4OJMuRLO0RWTKYg2f6BJFdWB0lXTAsD0Tg2aLoSgJMbGUaJsnaH7r3cSeo7yQpNl8QofLw5pdOhOztMbQbDjBWnkobhFdi8Gg6vdcdz_OSjarY9B-g6NhdSVzi0MiXpnEzFGP7yZAESAo8kwKNQ1BKZp_-Dnfp4Vsf3uDbydsoLjMv6BSeOb4DxJl51j9eQ1dnt-EFfiJm2QStuSD3ysCEkTtZQ";

/// Client registration whose authority is `base_url`.
#[allow(dead_code)]
pub fn identity_for(base_url: &str) -> IdentityConfig {
    IdentityConfig {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        tenant_id: TENANT.to_string(),
        authority_host: base_url.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        scopes: vec![
            "openid".to_string(),
            "profile".to_string(),
            "email".to_string(),
        ],
    }
}

/// Full configuration whose authority is `base_url`.
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.identity = identity_for(base_url);
    config.http.timeout_seconds = 5;
    config
}

/// Writes `contents` to `config.yaml` in a fresh temporary directory.
///
/// The directory is removed when the returned guard is dropped.
#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, contents).expect("config written");
    (dir, path)
}

/// YAML configuration for a registration whose authority is `base_url`.
#[allow(dead_code)]
pub fn config_yaml_for(base_url: &str) -> String {
    format!(
        "identity:\n  client_id: {CLIENT_ID}\n  client_secret: {CLIENT_SECRET}\n  tenant_id: {TENANT}\n  authority_host: {base_url}\n  redirect_uri: {REDIRECT_URI}\nhttp:\n  timeout_seconds: 5\n"
    )
}

/// Unsigned JWT carrying `claims`, as found in an id token for display.
#[allow(dead_code)]
pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.c2lnbmF0dXJl",
        engine.encode(br#"{"alg":"RS256","typ":"JWT","kid":"k"}"#),
        engine.encode(serde_json::to_vec(claims).expect("claims serialize"))
    )
}

/// Token endpoint success body with all five fields.
#[allow(dead_code)]
pub fn token_response_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "test_access_token_xyz",
        "token_type": "Bearer",
        "expires_in": 3599,
        "scope": "openid profile email",
        "id_token": unsigned_jwt(&serde_json::json!({
            "sub": "user-123",
            "name": "Ada Lovelace",
            "preferred_username": "ada@contoso.com"
        })),
    })
}

/// JWKS document publishing the public half of [`SIGNING_KEY_PEM`].
#[allow(dead_code)]
pub fn jwks_body() -> serde_json::Value {
    serde_json::json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": KID,
            "n": SIGNING_KEY_N,
            "e": "AQAB"
        }]
    })
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs()
}

/// Signs `claims` with RS256 using `pem`, advertising `kid`.
#[allow(dead_code)]
pub fn sign(claims: &serde_json::Value, pem: &str, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("valid RSA PEM");
    jsonwebtoken::encode(&header, claims, &key).expect("token signs")
}

/// Claims of a currently valid access token for `issuer` / `audience`.
#[allow(dead_code)]
pub fn access_claims(issuer: &str, audience: &str) -> serde_json::Value {
    let now = now_secs();
    serde_json::json!({
        "iss": issuer,
        "aud": audience,
        "sub": "user-123",
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
        "scp": "access_as_user"
    })
}
