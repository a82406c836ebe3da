//! Error types for aadlogin
//!
//! This module defines the crate-wide error enum used for configuration and
//! startup failures, and the [`AuthError`] taxonomy returned by the sign-in
//! operations, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for aadlogin operations
///
/// Covers configuration loading, file and serialization failures, and HTTP
/// client construction. Authentication outcomes use [`AuthError`] instead so
/// that callers can classify them.
#[derive(Error, Debug)]
pub enum AadLoginError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure classes of the sign-in flow
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization code or bearer token was supplied where one is required
    #[error("Not authenticated")]
    MissingCredential,

    /// The identity provider refused the exchange
    ///
    /// Raised for any non-200 token endpoint response, for an OAuth error
    /// document returned in place of tokens, and for an `error` parameter on
    /// the redirect callback.
    #[error("Authentication failed: {}", .description.as_deref().unwrap_or("Unknown error"))]
    ExchangeRejected {
        /// HTTP status of the token endpoint response, when one was received
        status: Option<u16>,
        /// Provider-supplied `error_description`, when available
        description: Option<String>,
    },

    /// The token endpoint answered 200 with a body that is not a token response
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    /// The identity provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// A bearer token failed local verification
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// Shorthand for an [`AuthError::ExchangeRejected`] without a status code.
    pub fn rejected(description: Option<String>) -> Self {
        Self::ExchangeRejected {
            status: None,
            description,
        }
    }

    /// Returns true when the failure originated on the provider side rather
    /// than from the credentials presented.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::Transport(_))
    }
}

/// Result type alias for aadlogin operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
