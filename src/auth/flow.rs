//! Challenge-or-validate login flow
//!
//! A request either carries an authorization code or it does not:
//!
//! ```text
//! Unauthenticated --(no code)--> RedirectRequired
//! PendingExchange --(exchange ok)--> Authenticated
//! PendingExchange --(any error)--> Failed
//! ```
//!
//! The outcome is returned as a value for the routing layer to render;
//! redirects are not signalled through the error path. Nothing survives
//! past a single request.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::authorize::authorization_url;
use crate::auth::claims::{decode_unverified, IdTokenClaims};
use crate::auth::exchange::AuthCodeExchanger;
use crate::config::IdentityConfig;
use crate::error::{AuthError, Result};

/// A user signed in for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    /// Access token returned by the token endpoint
    pub access_token: String,
    /// Claims decoded from the id token, when it could be decoded
    pub user_info: Option<IdTokenClaims>,
}

/// Result of resolving one login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// No code was supplied; send the browser to the provider
    RedirectRequired {
        /// Provider authorization URL
        location: String,
    },
    /// The code was redeemed
    Authenticated(AuthenticatedUser),
    /// The code could not be redeemed
    Failed(AuthError),
}

/// Drives the login state machine for one client registration.
pub struct LoginFlow {
    exchanger: Arc<AuthCodeExchanger>,
    login_url: String,
}

impl LoginFlow {
    /// Creates a flow whose redirect target is built once from `identity`.
    ///
    /// # Errors
    ///
    /// Returns error if the authorization URL cannot be built.
    pub fn new(exchanger: Arc<AuthCodeExchanger>, identity: &IdentityConfig) -> Result<Self> {
        let login_url = authorization_url(identity)?.to_string();
        Ok(Self {
            exchanger,
            login_url,
        })
    }

    /// Provider authorization URL used for every redirect.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Resolves a login attempt.
    ///
    /// An absent or empty code yields [`LoginOutcome::RedirectRequired`];
    /// otherwise the code is exchanged and the id token claims, if
    /// decodable, are attached to the signed-in user.
    pub async fn resolve(&self, code: Option<&str>) -> LoginOutcome {
        let code = match code {
            Some(code) if !code.is_empty() => code,
            _ => {
                tracing::debug!("No authorization code supplied, redirecting to provider");
                return LoginOutcome::RedirectRequired {
                    location: self.login_url.clone(),
                };
            }
        };

        match self.exchanger.exchange(code).await {
            Ok(token) => {
                let user_info = match decode_unverified(&token.id_token) {
                    Ok(claims) => Some(claims),
                    Err(e) => {
                        tracing::debug!(error = %e, "Id token claims not decodable");
                        None
                    }
                };
                LoginOutcome::Authenticated(AuthenticatedUser {
                    access_token: token.access_token,
                    user_info,
                })
            }
            Err(e) => LoginOutcome::Failed(e),
        }
    }

    /// Outcome for a callback on which the provider reported an error
    /// instead of issuing a code (for example, the user declined consent).
    pub fn provider_error(error: &str, description: Option<&str>) -> LoginOutcome {
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(error);
        tracing::warn!(error, description, "Provider returned an error on callback");
        LoginOutcome::Failed(AuthError::rejected(Some(description.to_string())))
    }
}
