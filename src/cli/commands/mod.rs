//! Subcommands module for Stateconf CLI

pub mod config;
pub mod simulate;

use stateconf::config::Config;
use stateconf::waiter::WaitContext;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Verbosity level
    pub verbosity: u8,
    /// Wait context; cancelled on Ctrl-C
    pub wait: WaitContext,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let wait = config.waiter.context();

        Self {
            config,
            verbosity: cli.verbosity(),
            wait,
        }
    }
}
