//! Configuration management for aadlogin
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The configuration is built once at process start and shared by
//! reference; no handler reads identity settings from ambient global state.

use crate::error::{AadLoginError, Result};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

/// Main configuration structure for aadlogin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity provider registration (client credentials, tenant, scopes)
    #[serde(default)]
    pub identity: IdentityConfig,
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Protected-route bearer token policy
    #[serde(default)]
    pub bearer: BearerConfig,
}

/// Identity provider registration
///
/// Mirrors an app registration on the Microsoft identity platform. The
/// authority is derived as `{authority_host}/{tenant_id}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Application (client) identifier
    #[serde(default)]
    pub client_id: String,

    /// Client secret of the confidential client
    #[serde(default)]
    pub client_secret: String,

    /// Directory (tenant) identifier, or `common` / `organizations`
    #[serde(default)]
    pub tenant_id: String,

    /// Base URL of the identity provider
    ///
    /// Overridable so tests can point the exchanger at a mock server.
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Redirect URI registered for this client
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Scopes requested at authorization and token exchange, in order
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8000/auth/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "openid".to_string(),
        "profile".to_string(),
        "email".to_string(),
    ]
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            tenant_id: String::new(),
            authority_host: default_authority_host(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("authority_host", &self.authority_host)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl IdentityConfig {
    /// Returns the tenant authority, e.g.
    /// `https://login.microsoftonline.com/<tenant>`.
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Returns the v2.0 authorization endpoint of the authority.
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    /// Returns the v2.0 token endpoint of the authority.
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }

    /// Returns the configured scopes joined by single spaces.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Issuer claim carried by v2.0 tokens of this authority.
    pub fn default_issuer(&self) -> String {
        format!("{}/v2.0", self.authority())
    }

    /// Signing keys document of this authority.
    pub fn default_jwks_uri(&self) -> String {
        format!("{}/discovery/v2.0/keys", self.authority())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8000`
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total timeout for a single provider request (seconds)
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// Timeout for establishing the TCP/TLS connection (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// How the protected route treats a presented bearer token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BearerMode {
    /// Accept any non-empty bearer value without local checks
    #[default]
    Passthrough,
    /// Verify signature, issuer, audience and expiry against the provider keys
    Verify,
}

/// Protected-route bearer token policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerConfig {
    /// Validation mode
    #[serde(default)]
    pub mode: BearerMode,

    /// Expected `aud` claim; required in verify mode
    #[serde(default)]
    pub audience: Option<String>,

    /// Expected `iss` claim; defaults to `{authority}/v2.0`
    #[serde(default)]
    pub issuer: Option<String>,

    /// Signing keys URL; defaults to `{authority}/discovery/v2.0/keys`
    #[serde(default)]
    pub jwks_uri: Option<String>,

    /// Accepted signature algorithms
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,

    /// Clock skew tolerated on `exp` and `nbf` (seconds)
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,

    /// How long a fetched key set is trusted before it is fetched again (seconds)
    #[serde(default = "default_jwks_cache_seconds")]
    pub jwks_cache_seconds: u64,

    /// Minimum gap between key set fetches triggered by an unknown `kid` (seconds)
    #[serde(default = "default_jwks_min_refresh_seconds")]
    pub jwks_min_refresh_seconds: u64,
}

fn default_algorithms() -> Vec<Algorithm> {
    vec![Algorithm::RS256]
}

fn default_leeway() -> u64 {
    60
}

fn default_jwks_cache_seconds() -> u64 {
    3600
}

fn default_jwks_min_refresh_seconds() -> u64 {
    30
}

impl Default for BearerConfig {
    fn default() -> Self {
        Self {
            mode: BearerMode::default(),
            audience: None,
            issuer: None,
            jwks_uri: None,
            algorithms: default_algorithms(),
            leeway_seconds: default_leeway(),
            jwks_cache_seconds: default_jwks_cache_seconds(),
            jwks_min_refresh_seconds: default_jwks_min_refresh_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or an
    /// environment override names an unknown bearer mode
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            identity: IdentityConfig::default(),
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            bearer: BearerConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AadLoginError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AadLoginError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(client_id) = std::env::var("AADLOGIN_CLIENT_ID") {
            self.identity.client_id = client_id;
        }

        if let Ok(client_secret) = std::env::var("AADLOGIN_CLIENT_SECRET") {
            self.identity.client_secret = client_secret;
        }

        if let Ok(tenant_id) = std::env::var("AADLOGIN_TENANT_ID") {
            self.identity.tenant_id = tenant_id;
        }

        if let Ok(host) = std::env::var("AADLOGIN_AUTHORITY_HOST") {
            self.identity.authority_host = host;
        }

        if let Ok(redirect_uri) = std::env::var("AADLOGIN_REDIRECT_URI") {
            self.identity.redirect_uri = redirect_uri;
        }

        if let Ok(scopes) = std::env::var("AADLOGIN_SCOPES") {
            self.identity.scopes = parse_scope_list(&scopes);
        }

        if let Ok(bind) = std::env::var("AADLOGIN_BIND_ADDRESS") {
            self.server.bind_address = bind;
        }

        if let Ok(timeout) = std::env::var("AADLOGIN_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid AADLOGIN_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(mode) = std::env::var("AADLOGIN_BEARER_MODE") {
            self.bearer.mode = match mode.trim().to_lowercase().as_str() {
                "passthrough" => BearerMode::Passthrough,
                "verify" => BearerMode::Verify,
                _ => {
                    return Err(AadLoginError::Config(format!(
                        "AADLOGIN_BEARER_MODE must be passthrough or verify, got {:?}",
                        mode
                    ))
                    .into())
                }
            };
        }

        if let Ok(audience) = std::env::var("AADLOGIN_BEARER_AUDIENCE") {
            self.bearer.audience = Some(audience);
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let crate::cli::Commands::Serve {
            bind: Some(bind), ..
        } = &cli.command
        {
            self.server.bind_address = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures the client registration is complete, URLs parse, the scope
    /// set is usable, and numeric settings are within range.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let identity = &self.identity;

        if identity.client_id.trim().is_empty() {
            return Err(
                AadLoginError::Config("identity.client_id must be set".to_string()).into(),
            );
        }

        if identity.client_secret.is_empty() {
            return Err(
                AadLoginError::Config("identity.client_secret must be set".to_string()).into(),
            );
        }

        if identity.tenant_id.trim().is_empty() {
            return Err(
                AadLoginError::Config("identity.tenant_id must be set".to_string()).into(),
            );
        }

        let host = Url::parse(&identity.authority_host).map_err(|e| {
            AadLoginError::Config(format!("identity.authority_host is not a valid URL: {}", e))
        })?;
        match host.scheme() {
            "https" => {}
            "http" => tracing::warn!(
                "identity.authority_host uses plain http: {}",
                identity.authority_host
            ),
            other => {
                return Err(AadLoginError::Config(format!(
                    "identity.authority_host has unsupported scheme: {}",
                    other
                ))
                .into())
            }
        }

        Url::parse(&identity.redirect_uri).map_err(|e| {
            AadLoginError::Config(format!("identity.redirect_uri is not a valid URL: {}", e))
        })?;

        if identity.scopes.is_empty() {
            return Err(
                AadLoginError::Config("identity.scopes cannot be empty".to_string()).into(),
            );
        }

        let mut seen = HashSet::new();
        for scope in &identity.scopes {
            if scope.is_empty() || scope.contains(char::is_whitespace) {
                return Err(AadLoginError::Config(format!(
                    "identity.scopes contains an invalid scope: {:?}",
                    scope
                ))
                .into());
            }
            if !seen.insert(scope.as_str()) {
                return Err(AadLoginError::Config(format!(
                    "identity.scopes contains a duplicate scope: {}",
                    scope
                ))
                .into());
            }
        }

        self.server
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|e| {
                AadLoginError::Config(format!(
                    "server.bind_address is not a socket address: {}",
                    e
                ))
            })?;

        if self.http.timeout_seconds == 0 {
            return Err(AadLoginError::Config(
                "http.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.http.connect_timeout_seconds == 0 {
            return Err(AadLoginError::Config(
                "http.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.bearer.mode == BearerMode::Verify {
            let audience_missing = self
                .bearer
                .audience
                .as_deref()
                .map_or(true, |aud| aud.trim().is_empty());
            if audience_missing {
                return Err(AadLoginError::Config(
                    "bearer.audience is required when bearer.mode is verify".to_string(),
                )
                .into());
            }

            if self.bearer.algorithms.is_empty() {
                return Err(AadLoginError::Config(
                    "bearer.algorithms cannot be empty".to_string(),
                )
                .into());
            }

            if self.bearer.jwks_cache_seconds == 0 {
                return Err(AadLoginError::Config(
                    "bearer.jwks_cache_seconds must be greater than 0".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Splits a scope list given as comma- and/or space-separated names.
fn parse_scope_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
