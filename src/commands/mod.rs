/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `serve`     — Run the HTTP sign-in service
- `login_url` — Print the provider authorization URL
- `exchange`  — Redeem an authorization code by hand

These handlers are small and delegate to the `auth` and `server` modules.
*/

use crate::auth::{build_http_client, AuthCodeExchanger};
use crate::config::Config;
use crate::error::Result;

/// Serve command
pub mod serve {
    use super::*;

    /// Run the sign-in service until interrupted
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    pub async fn run_serve(config: Config) -> Result<()> {
        crate::server::serve(&config).await
    }
}

/// Login URL command
pub mod login_url {
    use super::*;
    use crate::auth::authorize::authorization_url;

    /// Print the provider authorization URL to stdout
    pub fn print_login_url(config: &Config) -> Result<()> {
        let url = authorization_url(&config.identity)?;
        println!("{}", url);
        Ok(())
    }
}

/// Exchange command
pub mod exchange {
    use super::*;
    use crate::auth::claims::decode_unverified;

    /// Redeem `code` and print the outcome
    ///
    /// By default prints a short summary (token type, lifetime, granted
    /// scope and the signed-in user's name when the id token carries one).
    /// With `json` the full token response is printed.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AuthError`](crate::error::AuthError) when the
    /// exchange fails.
    pub async fn run_exchange(config: &Config, code: &str, json: bool) -> Result<()> {
        let http = build_http_client(&config.http)?;
        let exchanger = AuthCodeExchanger::new(http, config.identity.clone());

        let token = exchanger.exchange(code).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&token)?);
            return Ok(());
        }

        println!("Token type: {}", token.token_type);
        println!("Expires in: {}s", token.expires_in);
        println!("Scope:      {}", token.scope);
        if let Ok(claims) = decode_unverified(&token.id_token) {
            let who = claims
                .get("preferred_username")
                .or_else(|| claims.get("name"))
                .and_then(|v| v.as_str());
            if let Some(who) = who {
                println!("Signed in:  {}", who);
            }
        }
        Ok(())
    }

}
