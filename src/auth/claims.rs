//! Id token claims
//!
//! Decodes the payload segment of an OpenID Connect identity token so the
//! signed-in user's claims can be shown alongside the access token. The
//! signature is NOT checked here: the token was received directly from the
//! token endpoint over TLS and the claims are used for display only.

use base64::Engine as _;

use crate::error::AuthError;

/// Claims object carried in an id token payload.
pub type IdTokenClaims = serde_json::Map<String, serde_json::Value>;

/// Decodes the claims of a compact-serialized JWT without verifying it.
///
/// # Errors
///
/// Returns [`AuthError::InvalidToken`] if the token does not have three
/// segments, the payload is not base64url, or it is not a JSON object.
///
/// # Examples
///
/// ```
/// use aadlogin::auth::claims::decode_unverified;
///
/// // {"alg":"none"} . {"name":"Ada"} . (empty signature)
/// let token = "eyJhbGciOiJub25lIn0.eyJuYW1lIjoiQWRhIn0.";
/// let claims = decode_unverified(token).unwrap();
/// assert_eq!(claims["name"], "Ada");
/// ```
pub fn decode_unverified(token: &str) -> Result<IdTokenClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken("invalid JWT format".to_string()));
    }

    let payload = base64_url_decode(parts[1])?;
    serde_json::from_slice::<IdTokenClaims>(&payload)
        .map_err(|e| AuthError::InvalidToken(format!("invalid JWT claims: {e}")))
}

fn base64_url_decode(input: &str) -> Result<Vec<u8>, AuthError> {
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .map_err(|e| AuthError::InvalidToken(format!("invalid base64: {e}")))
}
