//! Error types for the convergence waiter.

use std::time::Duration;
use thiserror::Error;

/// Boxed error carried across the refresh boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a single refresh call.
///
/// The refresh adapter decides the classification: transient errors keep the
/// wait going, fatal errors end it immediately.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// Throttling or transport trouble; the waiter polls again after backoff.
    #[error("transient error: {0}")]
    Transient(#[source] BoxError),

    /// Anything else; the waiter gives up at once.
    #[error("{0}")]
    Fatal(#[source] BoxError),
}

impl RefreshError {
    /// Wrap an error as transient.
    pub fn transient(err: impl Into<BoxError>) -> Self {
        Self::Transient(err.into())
    }

    /// Wrap an error as fatal.
    pub fn fatal(err: impl Into<BoxError>) -> Self {
        Self::Fatal(err.into())
    }

    /// Returns true for [`RefreshError::Transient`].
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Rejected [`WaitSpec`](super::WaitSpec) configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// A label was listed as both pending and target.
    #[error("state '{0}' is both pending and target")]
    OverlappingState(String),

    /// The absence label was listed as pending.
    #[error("the absent state cannot be pending")]
    AbsentPending,

    /// Waiting with no time budget.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Terminal failure of a wait.
#[derive(Error, Debug)]
pub enum WaitError {
    /// Still pending when the timeout elapsed.
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {:?}){}",
        .expected.join(", "),
        .last_state.as_deref().unwrap_or_default(),
        .timeout,
        last_error_suffix(.last_error)
    )]
    Timeout {
        /// Configured timeout
        timeout: Duration,
        /// Time actually spent waiting
        elapsed: Duration,
        /// Last state observed, if any poll succeeded
        last_state: Option<String>,
        /// Target states
        expected: Vec<String>,
        /// Last transient error or failure reason
        last_error: Option<String>,
    },

    /// Observed a state that is neither pending nor target.
    #[error(
        "unexpected state '{}', wanted target '{}'{}",
        .state,
        .expected.join(", "),
        last_error_suffix(.last_error)
    )]
    UnexpectedState {
        /// The offending state
        state: String,
        /// Target states
        expected: Vec<String>,
        /// Failure reason or last transient error
        last_error: Option<String>,
    },

    /// The resource stayed absent while a target state was expected.
    #[error("couldn't find resource ({retries} retries){}", last_error_suffix(.last_error))]
    NotFound {
        /// Consecutive absent polls
        retries: u32,
        /// Last transient error or failure reason
        last_error: Option<String>,
    },

    /// The refresh function returned a fatal error.
    #[error("{0}")]
    Remote(#[source] BoxError),

    /// Target state reached but the payload reports a failure.
    #[error("resource entered {state} state: {reason}")]
    Failed {
        /// State the payload was observed in
        state: String,
        /// Server-side failure reason
        reason: String,
    },

    /// The caller cancelled the wait.
    #[error("wait cancelled")]
    Cancelled,
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(". last error: {}", e))
        .unwrap_or_default()
}

impl WaitError {
    /// Returns true for [`WaitError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for [`WaitError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true for [`WaitError::UnexpectedState`].
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, Self::UnexpectedState { .. })
    }

    /// Returns true for [`WaitError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The last error attached to this failure, if the variant carries one.
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Self::Timeout { last_error, .. }
            | Self::UnexpectedState { last_error, .. }
            | Self::NotFound { last_error, .. } => last_error.as_deref(),
            Self::Failed { reason, .. } => Some(reason),
            Self::Remote(_) | Self::Cancelled => None,
        }
    }

    /// Replace the last error on variants that carry one.
    ///
    /// Used to surface a server-side failure reason on a timeout or
    /// unexpected-state outcome. Other variants are returned unchanged.
    #[must_use]
    pub fn with_last_error(mut self, reason: impl Into<String>) -> Self {
        match &mut self {
            Self::Timeout { last_error, .. }
            | Self::UnexpectedState { last_error, .. }
            | Self::NotFound { last_error, .. } => *last_error = Some(reason.into()),
            Self::Remote(_) | Self::Failed { .. } | Self::Cancelled => {}
        }
        self
    }
}
