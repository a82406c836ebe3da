//! Command-line interface definition for aadlogin
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to run the sign-in service, print the provider
//! authorization URL, and redeem an authorization code by hand.

use clap::{Parser, Subcommand};

/// aadlogin - Microsoft identity platform sign-in service
///
/// Redirects browsers to the identity provider, exchanges authorization
/// codes for tokens, and gates routes behind a bearer token check.
#[derive(Parser, Debug, Clone)]
#[command(name = "aadlogin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "AADLOGIN_CONFIG", default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for aadlogin
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP sign-in service
    Serve {
        /// Override the bind address from config (e.g. 127.0.0.1:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the identity provider authorization URL
    LoginUrl,

    /// Redeem an authorization code at the token endpoint
    Exchange {
        /// Authorization code received on the redirect callback
        #[arg(long)]
        code: String,

        /// Print the full token response as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Serve { bind: None },
        }
    }
}
