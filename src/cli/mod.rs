//! CLI module for Stateconf
//!
//! Argument parsing and subcommand dispatch for the `stateconf` binary.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stateconf - replay and inspect convergence waits
#[derive(Parser, Debug, Clone)]
#[command(name = "stateconf")]
#[command(version)]
#[command(about = "Poll eventually-consistent resources until they settle", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "STATECONF_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay a scripted status sequence through the waiter
    Simulate(commands::simulate::SimulateArgs),

    /// Print the effective configuration
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "stateconf",
            "simulate",
            "--pending",
            "BUILDING",
            "--target",
            "READY,NOT_BUILT",
            "--sequence",
            "BUILDING,READY",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.pending, vec!["BUILDING"]);
                assert_eq!(args.target, vec!["READY", "NOT_BUILT"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["stateconf", "-vvvv", "config"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_sequence_is_required() {
        assert!(Cli::try_parse_from(["stateconf", "simulate", "--target", "READY"]).is_err());
    }
}
