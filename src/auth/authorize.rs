//! Authorization URL for the login redirect
//!
//! Builds the `{authority}/oauth2/v2.0/authorize` URL the browser is sent
//! to when no authorization code is available yet.

use url::Url;

use crate::config::IdentityConfig;
use crate::error::{AadLoginError, Result};

/// Builds the provider authorization URL for the configured client.
///
/// The query carries `client_id`, `response_type=code`, `redirect_uri`,
/// `response_mode=query` and the space-joined `scope`. Values are
/// percent-encoded.
///
/// # Errors
///
/// Returns [`AadLoginError::Config`] if the authority does not form a valid
/// URL.
///
/// # Examples
///
/// ```
/// use aadlogin::auth::authorize::authorization_url;
/// use aadlogin::config::IdentityConfig;
///
/// let identity = IdentityConfig {
///     client_id: "my-client".to_string(),
///     tenant_id: "my-tenant".to_string(),
///     ..Default::default()
/// };
/// let url = authorization_url(&identity).unwrap();
/// assert!(url.as_str().starts_with(
///     "https://login.microsoftonline.com/my-tenant/oauth2/v2.0/authorize?"
/// ));
/// ```
pub fn authorization_url(identity: &IdentityConfig) -> Result<Url> {
    let mut url = Url::parse(&identity.authorize_endpoint()).map_err(|e| {
        AadLoginError::Config(format!("invalid authorization endpoint URL: {e}"))
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", &identity.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &identity.redirect_uri)
        .append_pair("response_mode", "query")
        .append_pair("scope", &identity.scope_string());

    Ok(url)
}
