//! Refresh functions: one remote read translated into a state label.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

use super::error::RefreshError;

/// State label reported when the remote resource does not exist.
pub const ABSENT: &str = "";

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult<T> {
    /// State label the waiter matches against its pending and target sets.
    pub state: String,
    /// The remote object, when one was read.
    pub payload: Option<T>,
}

impl<T> PollResult<T> {
    /// A poll that read `payload` in `state`.
    pub fn new(state: impl Into<String>, payload: T) -> Self {
        Self {
            state: state.into(),
            payload: Some(payload),
        }
    }

    /// The resource is gone.
    pub fn absent() -> Self {
        Self {
            state: ABSENT.to_string(),
            payload: None,
        }
    }

    /// Returns true when this poll reported absence.
    pub fn is_absent(&self) -> bool {
        self.state == ABSENT
    }
}

/// Refresh result type.
pub type RefreshResult<T> = Result<PollResult<T>, RefreshError>;

/// A refresh function. Called once per poll; must issue exactly one remote read.
pub type Refresh<T> = Box<dyn Fn() -> BoxFuture<'static, RefreshResult<T>> + Send + Sync>;

/// Box an async closure as a [`Refresh`].
///
/// ```rust
/// use stateconf::waiter::{refresh_fn, PollResult};
///
/// let refresh = refresh_fn(|| async { Ok(PollResult::new("READY", 42u32)) });
/// # let _ = refresh;
/// ```
pub fn refresh_fn<T, F, Fut>(f: F) -> Refresh<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RefreshResult<T>> + Send + 'static,
{
    Box::new(move || f().boxed())
}

/// Common patterns for transient failures in free-form error messages.
pub fn is_transient_error_message(msg: &str) -> bool {
    const TRANSIENT_PATTERNS: &[&str] = &[
        "throttl",
        "rate exceeded",
        "too many requests",
        "request limit exceeded",
        "slow down",
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "connection closed",
        "service unavailable",
        "temporarily unavailable",
        "internal failure",
        "try again",
    ];

    let lower = msg.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}
