//! Authorization code redemption
//!
//! [`AuthCodeExchanger`] posts a form-encoded `authorization_code` grant to
//! the configured token endpoint and classifies the result:
//!
//! - `200` with a complete token body -> [`TokenResponse`]
//! - `200` with an OAuth error document -> [`AuthError::ExchangeRejected`]
//! - `200` with anything else -> [`AuthError::MalformedResponse`]
//! - any other status -> [`AuthError::ExchangeRejected`]
//! - connection failure or timeout -> [`AuthError::Transport`]
//!
//! Nothing is retried. Authorization codes are single use, so redeeming
//! the same code twice is expected to fail at the provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;
use crate::error::AuthError;

/// Grant type sent with every exchange.
pub const GRANT_TYPE: &str = "authorization_code";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Form body of a token exchange request.
///
/// Constructed fresh for every call and never persisted.
#[derive(Serialize)]
pub struct TokenExchangeRequest<'a> {
    /// Application (client) identifier
    pub client_id: &'a str,
    /// Client secret of the confidential client
    pub client_secret: &'a str,
    /// Authorization code from the redirect callback
    pub code: &'a str,
    /// Always [`GRANT_TYPE`]
    pub grant_type: &'static str,
    /// Redirect URI used in the authorization request
    pub redirect_uri: &'a str,
    /// Requested scopes, space-separated
    pub scope: String,
}

impl<'a> TokenExchangeRequest<'a> {
    /// Builds the request for `code` from the client registration.
    pub fn new(identity: &'a IdentityConfig, code: &'a str) -> Self {
        Self {
            client_id: &identity.client_id,
            client_secret: &identity.client_secret,
            code,
            grant_type: GRANT_TYPE,
            redirect_uri: &identity.redirect_uri,
            scope: identity.scope_string(),
        }
    }
}

impl std::fmt::Debug for TokenExchangeRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("code", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Successful token endpoint response.
///
/// All five fields are required; a body missing any of them, or carrying
/// them with the wrong JSON type, is rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for the requested resource
    pub access_token: String,
    /// Token type, normally `Bearer`
    pub token_type: String,
    /// Lifetime of the access token in seconds
    pub expires_in: u64,
    /// Scopes actually granted, space-separated
    pub scope: String,
    /// OpenID Connect identity token
    pub id_token: String,
}

/// OAuth error document (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthErrorBody {
    /// Prefers the human-readable description over the bare error code.
    fn into_description(self) -> String {
        self.error_description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(self.error)
    }
}

fn parse_oauth_error(body: &str) -> Option<OAuthErrorBody> {
    serde_json::from_str::<OAuthErrorBody>(body).ok()
}

/// Classifies a `200 OK` token endpoint body.
fn parse_token_body(body: &str) -> Result<TokenResponse, AuthError> {
    match serde_json::from_str::<TokenResponse>(body) {
        Ok(token) => Ok(token),
        Err(parse_err) => match parse_oauth_error(body) {
            Some(oauth_err) => Err(AuthError::ExchangeRejected {
                status: Some(200),
                description: Some(oauth_err.into_description()),
            }),
            None => Err(AuthError::MalformedResponse(parse_err.to_string())),
        },
    }
}

// ---------------------------------------------------------------------------
// AuthCodeExchanger
// ---------------------------------------------------------------------------

/// Redeems authorization codes at the identity provider's token endpoint.
///
/// Holds no per-request state; one instance is shared by every request
/// handler.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use aadlogin::auth::AuthCodeExchanger;
/// use aadlogin::config::IdentityConfig;
///
/// # async fn example() -> Result<(), aadlogin::error::AuthError> {
/// let identity = IdentityConfig {
///     client_id: "my-client".to_string(),
///     client_secret: "my-secret".to_string(),
///     tenant_id: "my-tenant".to_string(),
///     ..Default::default()
/// };
/// let exchanger = AuthCodeExchanger::new(Arc::new(reqwest::Client::new()), identity);
/// let token = exchanger.exchange("code-from-callback").await?;
/// println!("{}", token.token_type);
/// # Ok(())
/// # }
/// ```
pub struct AuthCodeExchanger {
    http: Arc<reqwest::Client>,
    identity: IdentityConfig,
    token_endpoint: String,
}

impl AuthCodeExchanger {
    /// Creates an exchanger for the given client registration.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client; its timeouts bound every exchange.
    /// * `identity` - Client registration and requested scopes.
    pub fn new(http: Arc<reqwest::Client>, identity: IdentityConfig) -> Self {
        let token_endpoint = identity.token_endpoint();
        Self {
            http,
            identity,
            token_endpoint,
        }
    }

    /// Returns the token endpoint this exchanger posts to.
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code from the redirect callback.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingCredential`] if `code` is empty (no request is
    ///   sent).
    /// - [`AuthError::Transport`] if the provider cannot be reached.
    /// - [`AuthError::ExchangeRejected`] for a non-200 status or an OAuth
    ///   error document, carrying the provider's `error_description`.
    /// - [`AuthError::MalformedResponse`] for a 200 body that is not a
    ///   complete token response.
    pub async fn exchange(&self, code: &str) -> Result<TokenResponse, AuthError> {
        if code.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let request = TokenExchangeRequest::new(&self.identity, code);
        tracing::debug!(
            endpoint = %self.token_endpoint,
            scope = %request.scope,
            "Redeeming authorization code"
        );

        let resp = self
            .http
            .post(&self.token_endpoint)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token endpoint unreachable");
                AuthError::Transport(format!("token exchange request failed: {e}"))
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            AuthError::Transport(format!("failed to read token response: {e}"))
        })?;

        if status != reqwest::StatusCode::OK {
            let description = parse_oauth_error(&body).map(OAuthErrorBody::into_description);
            tracing::warn!(
                status = status.as_u16(),
                description = description.as_deref().unwrap_or(""),
                "Token endpoint rejected authorization code"
            );
            return Err(AuthError::ExchangeRejected {
                status: Some(status.as_u16()),
                description,
            });
        }

        let token = parse_token_body(&body).map_err(|e| {
            tracing::warn!(error = %e, "Token endpoint returned an unusable body");
            e
        })?;

        tracing::info!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Authorization code redeemed"
        );
        Ok(token)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
