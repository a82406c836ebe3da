//! aadlogin - Microsoft identity platform sign-in library
//!
//! This library provides the pieces of a small OpenID Connect sign-in
//! service: the login redirect, authorization code redemption, and a
//! bearer-gated route.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Authorization URL, code exchange, login flow, bearer policy
//! - `server`: axum router and handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: CLI command handlers
//!
//! # Example
//!
//! ```no_run
//! use aadlogin::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     aadlogin::server::serve(&config).await
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthCodeExchanger, LoginFlow, LoginOutcome, TokenResponse};
pub use config::Config;
pub use error::{AadLoginError, AuthError, Result};
