//! Rendering of sign-in outcomes

use axum::http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::error::AuthError;

impl AuthError {
    /// HTTP status used when this error ends a request.
    ///
    /// Credential problems are `401`. Failures reaching or understanding the
    /// identity provider are `502`, since the client did nothing wrong.
    pub fn status_code(&self) -> StatusCode {
        if self.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::UNAUTHORIZED
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let challenge = match &self {
            AuthError::InvalidToken(_) => Some(r#"Bearer error="invalid_token""#),
            _ if status == StatusCode::UNAUTHORIZED => Some("Bearer"),
            _ => None,
        };

        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        let mut response = (status, body).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

/// Page shown after a successful callback.
pub fn success_page(access_token: &str) -> Html<String> {
    Html(format!(
        r#"<html>
    <body>
        <h1>Azure AD Authentication Successful!</h1>
        <p>You have successfully authenticated with Azure AD.</p>
        <p><strong>Access Token:</strong> {}</p>
    </body>
</html>
"#,
        escape_html(access_token)
    ))
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
