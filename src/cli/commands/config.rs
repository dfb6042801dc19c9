//! Config command - print the effective configuration

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the config command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

impl ConfigArgs {
    /// Execute the config command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let rendered = if self.json {
            serde_json::to_string_pretty(&ctx.config)?
        } else {
            ctx.config.to_toml()?
        };

        println!("{}", rendered.trim_end());
        Ok(0)
    }
}
