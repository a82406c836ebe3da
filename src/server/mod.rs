//! HTTP surface of the sign-in service
//!
//! Routes:
//!
//! - `GET /login` -- 307 to the provider authorization URL
//! - `GET /auth/callback` -- redeem `?code=`, render the success page
//! - `GET /` -- challenge-or-validate using the bearer value as a code
//! - `GET /protected` -- bearer-gated route
//! - `GET /health` -- liveness probe

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::auth::{build_http_client, AuthCodeExchanger, BearerValidator, LoginFlow};
use crate::config::Config;
use crate::error::{AadLoginError, Result};

pub mod handlers;
pub mod response;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Login state machine (owns the code exchanger)
    pub flow: Arc<LoginFlow>,
    /// Protected-route bearer policy
    pub bearer: Arc<BearerValidator>,
}

impl AppState {
    /// Wires the exchanger, login flow and bearer policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or the authorization URL cannot be
    /// built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client(&config.http)?;
        let exchanger = Arc::new(AuthCodeExchanger::new(
            Arc::clone(&http),
            config.identity.clone(),
        ));
        let flow = Arc::new(LoginFlow::new(exchanger, &config.identity)?);
        let bearer = Arc::new(BearerValidator::from_config(config, http));
        Ok(Self { flow, bearer })
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/login", get(handlers::login))
        .route("/auth/callback", get(handlers::callback))
        .route("/protected", get(handlers::protected))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
///
/// Returns error if the address cannot be parsed or bound, or the server
/// fails while running.
pub async fn serve(config: &Config) -> Result<()> {
    let addr: SocketAddr = config.server.bind_address.parse().map_err(|e| {
        AadLoginError::Config(format!("server.bind_address is not a socket address: {e}"))
    })?;

    let app = router(AppState::from_config(config)?);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AadLoginError::Io)?;
    let local_addr = listener.local_addr().map_err(AadLoginError::Io)?;

    tracing::info!(
        address = %local_addr,
        authority = %config.identity.authority(),
        "Sign-in service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AadLoginError::Io)?;

    tracing::info!("Sign-in service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
