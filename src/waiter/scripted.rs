//! Scripted refresh functions.
//!
//! Replays a fixed sequence of poll results, repeating the last one once the
//! script runs out. Used by the `simulate` command to dry-run a wait
//! configuration, and by tests.
//!
//! Script syntax, comma separated:
//! - `NAME`: the resource is in state `NAME`
//! - `-`: the resource is absent
//! - `~message`: transient refresh error
//! - `!message`: fatal refresh error

use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;

use super::error::RefreshError;
use super::refresh::{refresh_fn, PollResult, Refresh};
use crate::error::{Error, Result};

/// One scripted poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Resource present in this state.
    State(String),
    /// Resource absent.
    Absent,
    /// Transient refresh error.
    Transient(String),
    /// Fatal refresh error.
    Fatal(String),
}

impl FromStr for ScriptStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.is_empty() {
            return Err(Error::InvalidArgument("empty script step".to_string()));
        }

        Ok(match token {
            "-" => Self::Absent,
            t if t.starts_with('~') => Self::Transient(t[1..].to_string()),
            t if t.starts_with('!') => Self::Fatal(t[1..].to_string()),
            t => Self::State(t.to_string()),
        })
    }
}

/// Payload produced by a scripted poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedPoll {
    /// 1-indexed refresh call.
    pub attempt: u32,
    /// State reported.
    pub state: String,
}

/// A refresh function that replays a script.
#[derive(Debug, Clone)]
pub struct ScriptedRefresh {
    steps: Arc<Vec<ScriptStep>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedRefresh {
    /// Create from parsed steps.
    pub fn new(steps: Vec<ScriptStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::InvalidArgument("script has no steps".to_string()));
        }
        Ok(Self {
            steps: Arc::new(steps),
            calls: Arc::new(Mutex::new(0)),
        })
    }

    /// Parse a comma separated script.
    pub fn parse(script: &str) -> Result<Self> {
        let steps = script
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<ScriptStep>>>()?;
        Self::new(steps)
    }

    /// Number of refresh calls made so far.
    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    /// A refresh function sharing this script's cursor.
    pub fn refresh(&self) -> Refresh<ScriptedPoll> {
        let steps = Arc::clone(&self.steps);
        let calls = Arc::clone(&self.calls);

        refresh_fn(move || {
            let step = {
                let mut calls = calls.lock();
                let index = (*calls as usize).min(steps.len() - 1);
                *calls += 1;
                (steps[index].clone(), *calls)
            };

            async move {
                let (step, attempt) = step;
                match step {
                    ScriptStep::State(state) => Ok(PollResult::new(
                        state.clone(),
                        ScriptedPoll { attempt, state },
                    )),
                    ScriptStep::Absent => Ok(PollResult::absent()),
                    ScriptStep::Transient(msg) => Err(RefreshError::transient(msg)),
                    ScriptStep::Fatal(msg) => Err(RefreshError::fatal(msg)),
                }
            }
        })
    }
}
