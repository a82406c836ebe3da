//! Bearer token policy for protected routes
//!
//! [`extract_bearer`] pulls the token out of the `Authorization` header.
//! [`BearerValidator`] then applies the configured [`BearerMode`]:
//!
//! - `passthrough` accepts any present value. No signature, issuer or
//!   expiry check is made; suitable for demos only.
//! - `verify` checks the JWT signature against the provider's published
//!   signing keys, plus issuer, audience, `exp` and `nbf`.
//!
//! Signing keys are fetched on first use and cached for
//! `jwks_cache_seconds`, after which they are fetched again so that keys
//! the provider has withdrawn stop being trusted. A `kid` missing from the
//! cache forces an early refetch, at most once per
//! `jwks_min_refresh_seconds`; inside that window unknown `kid`s are
//! rejected from the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::auth::claims::IdTokenClaims;
use crate::config::{BearerMode, Config};
use crate::error::AuthError;

/// Returns the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// Returns [`AuthError::MissingCredential`] when the header is absent, not
/// valid UTF-8, uses another scheme, or carries an empty token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// A bearer token accepted by the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct BearerPrincipal {
    /// The presented token
    pub token: String,
    /// Verified claims; `None` in passthrough mode
    pub claims: Option<IdTokenClaims>,
}

/// Applies the configured bearer policy.
pub struct BearerValidator {
    verifier: Option<JwtVerifier>,
}

impl BearerValidator {
    /// Accepts every non-empty token.
    pub fn passthrough() -> Self {
        Self { verifier: None }
    }

    /// Builds the validator described by `config.bearer`.
    ///
    /// Issuer and signing keys URL default to the configured authority.
    pub fn from_config(config: &Config, http: Arc<reqwest::Client>) -> Self {
        let bearer = &config.bearer;
        match bearer.mode {
            BearerMode::Passthrough => {
                tracing::warn!(
                    "Bearer tokens on protected routes are accepted without verification"
                );
                Self::passthrough()
            }
            BearerMode::Verify => {
                let issuer = bearer
                    .issuer
                    .clone()
                    .unwrap_or_else(|| config.identity.default_issuer());
                let jwks_uri = bearer
                    .jwks_uri
                    .clone()
                    .unwrap_or_else(|| config.identity.default_jwks_uri());

                let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
                validation.algorithms = bearer.algorithms.clone();
                validation.leeway = bearer.leeway_seconds;
                validation.validate_nbf = true;
                validation.set_issuer(&[issuer.as_str()]);
                if let Some(audience) = &bearer.audience {
                    validation.set_audience(&[audience.as_str()]);
                }
                validation.set_required_spec_claims(&["exp", "iss", "aud"]);

                tracing::info!(%issuer, %jwks_uri, "Bearer tokens will be verified");
                Self {
                    verifier: Some(JwtVerifier {
                        http,
                        jwks_uri,
                        validation,
                        cache_ttl: Duration::from_secs(bearer.jwks_cache_seconds),
                        min_refresh: Duration::from_secs(bearer.jwks_min_refresh_seconds),
                        keys: RwLock::new(None),
                    }),
                }
            }
        }
    }

    /// Returns true when tokens are cryptographically verified.
    pub fn verifies(&self) -> bool {
        self.verifier.is_some()
    }

    /// Validates a bearer token according to the policy.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredential`] for an empty token.
    /// - [`AuthError::InvalidToken`] when verification fails.
    /// - [`AuthError::Transport`] / [`AuthError::MalformedResponse`] when the
    ///   signing keys cannot be fetched.
    pub async fn validate(&self, token: &str) -> Result<BearerPrincipal, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let claims = match &self.verifier {
            None => None,
            Some(verifier) => Some(verifier.verify(token).await?),
        };

        Ok(BearerPrincipal {
            token: token.to_string(),
            claims,
        })
    }
}

struct JwtVerifier {
    http: Arc<reqwest::Client>,
    jwks_uri: String,
    validation: Validation,
    cache_ttl: Duration,
    min_refresh: Duration,
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

enum CacheLookup {
    Hit(Jwk),
    /// Fresh cache without the `kid`, fetched too recently to fetch again
    Unknown,
    Refresh,
}

impl CachedKeys {
    fn lookup(&self, kid: &str, ttl: Duration, min_refresh: Duration) -> CacheLookup {
        let age = self.fetched_at.elapsed();
        if age >= ttl {
            return CacheLookup::Refresh;
        }
        match self.set.find(kid) {
            Some(jwk) => CacheLookup::Hit(jwk.clone()),
            None if age < min_refresh => CacheLookup::Unknown,
            None => CacheLookup::Refresh,
        }
    }
}

impl JwtVerifier {
    async fn verify(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("invalid JWT header: {e}")))?;

        if !self.validation.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidToken(format!(
                "algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::InvalidToken("JWT missing 'kid' header".to_string()))?;

        let jwk = self.signing_key(kid).await?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| AuthError::InvalidToken(format!("invalid JWK: {e}")))?;

        let mut validation = self.validation.clone();
        validation.algorithms = vec![header.alg];

        let data = decode::<IdTokenClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AuthError::InvalidToken(format!("token verification failed: {e}"))
        })?;

        Ok(data.claims)
    }

    /// Looks up `kid`, refetching the key set when the cache has expired or
    /// an unknown `kid` arrives outside the refresh window.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        let cached = self
            .keys
            .read()
            .await
            .as_ref()
            .map(|keys| keys.lookup(kid, self.cache_ttl, self.min_refresh));
        match cached {
            Some(CacheLookup::Hit(jwk)) => return Ok(jwk),
            Some(CacheLookup::Unknown) => return Err(unknown_kid(kid)),
            Some(CacheLookup::Refresh) | None => {}
        }

        let mut keys = self.keys.write().await;

        // Another request may have refreshed while we waited for the lock.
        match keys
            .as_ref()
            .map(|keys| keys.lookup(kid, self.cache_ttl, self.min_refresh))
        {
            Some(CacheLookup::Hit(jwk)) => return Ok(jwk),
            Some(CacheLookup::Unknown) => return Err(unknown_kid(kid)),
            Some(CacheLookup::Refresh) | None => {}
        }

        let set = self.fetch_jwks().await?;
        let found = set.find(kid).cloned();
        *keys = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        found.ok_or_else(|| unknown_kid(kid))
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(jwks_uri = %self.jwks_uri, "Fetching signing keys");

        let resp = self
            .http
            .get(&self.jwks_uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Transport(format!("failed to fetch JWKS: {e}")))?;

        if !resp.status().is_success() {
            return Err(AuthError::Transport(format!(
                "JWKS endpoint returned {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Transport(format!("failed to read JWKS: {e}")))?;

        serde_json::from_str::<JwkSet>(&body)
            .map_err(|e| AuthError::MalformedResponse(format!("invalid JWKS: {e}")))
    }
}

fn unknown_kid(kid: &str) -> AuthError {
    AuthError::InvalidToken(format!("signing key '{kid}' not found"))
}
