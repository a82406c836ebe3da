//! aadlogin - Microsoft identity platform sign-in service
//!
#![doc = "aadlogin - Microsoft identity platform sign-in service"]
#![doc = "Main entry point for the aadlogin binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aadlogin::cli::{Cli, Commands};
use aadlogin::commands;
use aadlogin::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting sign-in service");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::LoginUrl => {
            commands::login_url::print_login_url(&config)?;
            Ok(())
        }
        Commands::Exchange { code, json } => {
            tracing::info!("Redeeming authorization code");
            commands::exchange::run_exchange(&config, &code, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose { "aadlogin=debug" } else { "aadlogin=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
