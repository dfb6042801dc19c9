//! Stateconf - replay and inspect convergence waits
//!
//! This is the main entry point for the Stateconf CLI.

mod cli;

use anyhow::{Context, Result};
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use stateconf::config::Config;
use tracing::{debug, warn};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Initialize logging from config, raised by -v
    stateconf::telemetry::init_from_config(&config.logging, cli.verbosity())
        .context("Failed to initialize logging")?;
    debug!(version = VERSION, "Stateconf starting");

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Ctrl-C cancels any wait in flight
    let cancel = ctx.wait.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Simulate(args) => args.execute(&mut ctx).await?,
        Commands::Config(args) => args.execute(&mut ctx).await?,
    };

    std::process::exit(exit_code);
}
