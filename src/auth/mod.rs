//! OpenID Connect sign-in against the Microsoft identity platform
//!
//! # Module Layout
//!
//! - [`authorize`] -- authorization URL for the login redirect
//! - [`exchange`]  -- authorization code redemption at the token endpoint
//! - [`claims`]    -- id token claims decoding for display
//! - [`flow`]      -- challenge-or-validate login state machine
//! - [`bearer`]    -- bearer token extraction and protected-route policy

use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{AadLoginError, Result};

pub mod authorize;
pub mod bearer;
pub mod claims;
pub mod exchange;
pub mod flow;

pub use bearer::{extract_bearer, BearerPrincipal, BearerValidator};
pub use exchange::{AuthCodeExchanger, TokenExchangeRequest, TokenResponse};
pub use flow::{AuthenticatedUser, LoginFlow, LoginOutcome};

/// Builds the shared outbound HTTP client used for all provider calls.
///
/// Both the request timeout and the connect timeout come from configuration
/// so that a stalled identity provider cannot hold a request open forever.
///
/// # Errors
///
/// Returns error if the TLS backend cannot be initialized.
pub fn build_http_client(config: &HttpConfig) -> Result<Arc<reqwest::Client>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .user_agent(concat!("aadlogin/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(AadLoginError::Http)?;
    Ok(Arc::new(client))
}
