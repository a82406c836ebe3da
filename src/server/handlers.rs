//! Route handlers
//!
//! Handlers translate a [`LoginOutcome`] or [`AuthError`] into a response;
//! none of them signal redirects through the error path.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;

use super::response::success_page;
use super::AppState;
use crate::auth::{extract_bearer, LoginFlow, LoginOutcome};
use crate::error::AuthError;

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code on success
    pub code: Option<String>,
    /// OAuth error code when the provider declined to issue a code
    pub error: Option<String>,
    /// Human-readable detail for `error`
    pub error_description: Option<String>,
}

/// `GET /login`
pub async fn login(State(state): State<AppState>) -> Redirect {
    tracing::debug!("Redirecting to identity provider");
    Redirect::temporary(state.flow.login_url())
}

/// `GET /auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let outcome = match params.error.as_deref() {
        Some(error) => LoginFlow::provider_error(error, params.error_description.as_deref()),
        None => state.flow.resolve(params.code.as_deref()).await,
    };

    match outcome {
        LoginOutcome::RedirectRequired { location } => {
            Redirect::temporary(&location).into_response()
        }
        LoginOutcome::Authenticated(user) => {
            tracing::info!("Callback sign-in succeeded");
            success_page(&user.access_token).into_response()
        }
        LoginOutcome::Failed(e) => failure(e),
    }
}

/// `GET /`
///
/// The bearer value, when present, is redeemed as an authorization code.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let code = extract_bearer(&headers).ok();

    match state.flow.resolve(code).await {
        LoginOutcome::RedirectRequired { location } => {
            Redirect::temporary(&location).into_response()
        }
        LoginOutcome::Authenticated(user) => Json(serde_json::json!({
            "message": "Welcome! You are authenticated",
            "user": user,
        }))
        .into_response(),
        LoginOutcome::Failed(e) => failure(e),
    }
}

/// `GET /protected`
pub async fn protected(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthError> {
    let token = extract_bearer(&headers)?;
    let principal = state.bearer.validate(token).await.map_err(|e| {
        tracing::info!(error = %e, "Protected route rejected bearer token");
        e
    })?;

    let mut body = serde_json::json!({
        "message": "You are authenticated!",
        "token": principal.token,
    });
    if let Some(claims) = principal.claims {
        body["claims"] = serde_json::Value::Object(claims);
    }
    Ok(Json(body))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

fn failure(error: AuthError) -> Response {
    tracing::warn!(error = %error, status = error.status_code().as_u16(), "Sign-in failed");
    error.into_response()
}
