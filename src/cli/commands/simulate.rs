//! Simulate command - replay a status sequence through the waiter
//!
//! Lets a wait configuration be tried without touching a real API:
//!
//! ```text
//! stateconf simulate --pending BUILDING --target READY,NOT_BUILT \
//!     --sequence BUILDING,~throttled,BUILDING,READY --interval 1s
//! ```

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use stateconf::config::parse_duration;
use stateconf::waiter::scripted::ScriptedRefresh;
use stateconf::waiter::{BackoffPolicy, WaitOutcome, WaitSpec};

/// Arguments for the simulate command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Pending states, comma separated
    #[arg(long, value_delimiter = ',')]
    pub pending: Vec<String>,

    /// Target states, comma separated. Omit to wait for absence
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Scripted poll results: STATE, '-' for absent, '~msg' transient error, '!msg' fatal error
    #[arg(long, required = true, allow_hyphen_values = true)]
    pub sequence: String,

    /// Overall timeout
    #[arg(long, default_value = "30s", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Fixed poll interval (default: the configured backoff)
    #[arg(long, value_parser = parse_duration_arg)]
    pub interval: Option<Duration>,

    /// Delay before the first poll
    #[arg(long, value_parser = parse_duration_arg)]
    pub delay: Option<Duration>,

    /// Absent polls tolerated while a target is expected
    #[arg(long)]
    pub not_found_checks: Option<u32>,

    /// Consecutive target observations required
    #[arg(long, default_value = "1")]
    pub continuous_target_occurrence: u32,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_duration_arg(value: &str) -> std::result::Result<Duration, String> {
    parse_duration(value).map_err(|e| format!("{:#}", e))
}

/// Outcome summary printed by the command
#[derive(Debug, Serialize)]
struct Report {
    success: bool,
    state: Option<String>,
    attempts: u32,
    #[serde(with = "humantime_serde")]
    elapsed: Duration,
    script_calls: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Report {
    fn new<T>(outcome: &WaitOutcome<T>, script_calls: u32) -> Self {
        Self {
            success: outcome.is_success(),
            state: outcome.last_state.clone(),
            attempts: outcome.attempts,
            elapsed: outcome.elapsed,
            script_calls,
            error: outcome.error().map(|e| e.to_string()),
        }
    }

    fn render(&self) -> String {
        let state = match self.state.as_deref() {
            Some("") | None => "<absent>",
            Some(state) => state,
        };

        match &self.error {
            None => format!(
                "converged: state {} after {} attempt(s) in {}",
                state,
                self.attempts,
                humantime_serde::re::humantime::format_duration(self.elapsed)
            ),
            Some(error) => format!(
                "failed after {} attempt(s) in {}: {}",
                self.attempts,
                humantime_serde::re::humantime::format_duration(self.elapsed),
                error
            ),
        }
    }
}

impl SimulateArgs {
    /// Execute the simulate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let script = ScriptedRefresh::parse(&self.sequence).context("Invalid --sequence")?;

        let mut builder = WaitSpec::builder(script.refresh())
            .pending(self.pending.iter().map(|s| s.trim().to_string()))
            .target(self.target.iter().map(|s| s.trim().to_string()))
            .timeout(self.timeout)
            .continuous_target_occurrence(self.continuous_target_occurrence);

        if let Some(interval) = self.interval {
            builder = builder.backoff(BackoffPolicy::fixed(interval));
        }
        if let Some(delay) = self.delay {
            builder = builder.delay(delay);
        }
        if let Some(checks) = self.not_found_checks {
            builder = builder.not_found_checks(checks);
        }

        let spec = builder.build().context("Invalid wait configuration")?;
        debug!(?spec, "Simulating wait");

        let outcome = spec.wait(&ctx.wait).await;
        let report = Report::new(&outcome, script.calls());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.render());
            if ctx.verbosity > 0 {
                println!("refresh calls: {}", report.script_calls);
            }
        }

        Ok(if report.success { 0 } else { 1 })
    }
}
