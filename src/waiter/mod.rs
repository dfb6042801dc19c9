//! Convergence waiter.
//!
//! Turns an eventually-consistent remote resource into a synchronous
//! operation: a refresh function is polled with backoff until the state it
//! reports lands in the target set, leaves the pending set, the timeout
//! elapses, or the caller cancels.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use stateconf::waiter::{refresh_fn, PollResult, WaitContext, WaitSpec};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = WaitSpec::builder(refresh_fn(|| async { Ok(PollResult::new("READY", ())) }))
//!     .pending(["BUILDING"])
//!     .target(["READY", "NOT_BUILT"])
//!     .timeout(Duration::from_secs(300))
//!     .build()?;
//!
//! let outcome = spec.wait(&WaitContext::new()).await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod error;
pub mod refresh;
pub mod scripted;

pub use backoff::{BackoffPolicy, BackoffStrategy, JitterStrategy};
pub use error::{BoxError, RefreshError, SpecError, WaitError};
pub use refresh::{
    is_transient_error_message, refresh_fn, PollResult, Refresh, RefreshResult, ABSENT,
};

use indexmap::IndexSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consecutive absent polls tolerated while a target state is expected.
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Stand-in deadline for timeouts too large to add to an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A server-side failure carried by a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The payload's own status, e.g. `FAILED`.
    pub state: String,
    /// Human-readable reason reported by the service.
    pub reason: String,
}

impl Failure {
    /// A failure in `state` for `reason`.
    pub fn new(state: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            reason: reason.into(),
        }
    }
}

/// Post-poll inspection hook: returns the failure carried by the payload.
pub type Inspector<T> = Box<dyn Fn(&T) -> Option<Failure> + Send + Sync>;

// ============================================================================
// Wait Context
// ============================================================================

/// Caller-owned context threaded into every wait.
///
/// Carries the cancellation signal and the defaults (backoff, not-found
/// tolerance) used by specs that do not set their own.
#[derive(Debug, Clone)]
pub struct WaitContext {
    cancel: CancellationToken,
    backoff: BackoffPolicy,
    not_found_checks: u32,
}

impl Default for WaitContext {
    fn default() -> Self {
        Self {
            cancel: CancellationToken::new(),
            backoff: BackoffPolicy::default(),
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
        }
    }
}

impl WaitContext {
    /// A context with a fresh cancellation token and the default backoff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set the default backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the default not-found tolerance.
    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// A context cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            backoff: self.backoff.clone(),
            not_found_checks: self.not_found_checks,
        }
    }

    /// Cancel every wait running under this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The default backoff.
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// The default not-found tolerance.
    pub fn not_found_checks(&self) -> u32 {
        self.not_found_checks
    }
}

// ============================================================================
// Wait Spec
// ============================================================================

/// Configuration of one wait.
pub struct WaitSpec<T> {
    pending: IndexSet<String>,
    target: IndexSet<String>,
    timeout: Duration,
    delay: Duration,
    backoff: Option<BackoffPolicy>,
    not_found_checks: Option<u32>,
    continuous_target_occurrence: u32,
    refresh: Refresh<T>,
    failure_reason: Option<Inspector<T>>,
}

impl<T> fmt::Debug for WaitSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSpec")
            .field("pending", &self.pending)
            .field("target", &self.target)
            .field("timeout", &self.timeout)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("not_found_checks", &self.not_found_checks)
            .field("continuous_target_occurrence", &self.continuous_target_occurrence)
            .field("failure_reason", &self.failure_reason.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> WaitSpec<T> {
    /// Start building a spec around a refresh function.
    pub fn builder(refresh: Refresh<T>) -> WaitSpecBuilder<T> {
        WaitSpecBuilder::new(refresh)
    }

    /// Pending states.
    pub fn pending(&self) -> &IndexSet<String> {
        &self.pending
    }

    /// Target states. Empty means absence is success.
    pub fn target(&self) -> &IndexSet<String> {
        &self.target
    }

    /// Overall timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn expected(&self) -> Vec<String> {
        self.target.iter().cloned().collect()
    }

    /// Poll until the spec converges. See [`wait`].
    pub async fn wait(&self, ctx: &WaitContext) -> WaitOutcome<T> {
        wait(ctx, self).await
    }
}

/// Builder for [`WaitSpec`].
pub struct WaitSpecBuilder<T> {
    spec: WaitSpec<T>,
}

impl<T> WaitSpecBuilder<T> {
    /// Create a builder with no states and no timeout.
    pub fn new(refresh: Refresh<T>) -> Self {
        Self {
            spec: WaitSpec {
                pending: IndexSet::new(),
                target: IndexSet::new(),
                timeout: Duration::ZERO,
                delay: Duration::ZERO,
                backoff: None,
                not_found_checks: None,
                continuous_target_occurrence: 1,
                refresh,
                failure_reason: None,
            },
        }
    }

    /// Set the pending states.
    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.pending = states.into_iter().map(Into::into).collect();
        self
    }

    /// Set the target states. Leave empty to wait for the resource to disappear.
    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.target = states.into_iter().map(Into::into).collect();
        self
    }

    /// Set the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    /// Wait this long before the first refresh.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.spec.delay = delay;
        self
    }

    /// Override the context's backoff.
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.spec.backoff = Some(backoff);
        self
    }

    /// Consecutive absent polls tolerated while a target state is expected.
    /// Defaults to the context's value.
    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.spec.not_found_checks = Some(checks);
        self
    }

    /// Consecutive target observations required before succeeding.
    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.spec.continuous_target_occurrence = occurrences.max(1);
        self
    }

    /// Inspect the final payload for a failure.
    ///
    /// A failure found on a converged payload turns the outcome into
    /// [`WaitError::Failed`] with the payload's own state; on timeout or
    /// unexpected state its reason becomes the error's last error.
    pub fn failure_reason<F>(mut self, inspect: F) -> Self
    where
        F: Fn(&T) -> Option<Failure> + Send + Sync + 'static,
    {
        self.spec.failure_reason = Some(Box::new(inspect));
        self
    }

    /// Validate and build the spec.
    pub fn build(self) -> Result<WaitSpec<T>, SpecError> {
        let spec = self.spec;

        if spec.timeout.is_zero() {
            return Err(SpecError::ZeroTimeout);
        }
        if spec.pending.contains(ABSENT) {
            return Err(SpecError::AbsentPending);
        }
        if let Some(state) = spec.pending.iter().find(|s| spec.target.contains(*s)) {
            return Err(SpecError::OverlappingState(state.clone()));
        }

        Ok(spec)
    }
}

// ============================================================================
// Wait Outcome
// ============================================================================

/// Result of a wait: the last payload plus the terminal classification.
#[derive(Debug)]
pub struct WaitOutcome<T> {
    /// Payload of the last poll that returned without error.
    pub payload: Option<T>,
    /// State of that poll.
    pub last_state: Option<String>,
    /// Number of refresh calls made.
    pub attempts: u32,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// `None` on success.
    pub error: Option<WaitError>,
}

impl<T> WaitOutcome<T> {
    /// Returns true when the wait converged.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&WaitError> {
        self.error.as_ref()
    }

    /// Payload on success, error otherwise.
    pub fn into_result(self) -> Result<Option<T>, WaitError> {
        match self.error {
            None => Ok(self.payload),
            Some(err) => Err(err),
        }
    }

    /// Payload and error, both kept.
    pub fn into_parts(self) -> (Option<T>, Option<WaitError>) {
        (self.payload, self.error)
    }
}

// ============================================================================
// Engine
// ============================================================================

enum Verdict {
    Converged,
    Pending,
    Absent,
    Unexpected,
}

enum Interrupt {
    Cancelled,
    Deadline,
}

struct Run<T> {
    started: Instant,
    attempts: u32,
    payload: Option<T>,
    last_state: Option<String>,
    last_error: Option<String>,
}

impl<T> Run<T> {
    fn new(started: Instant) -> Self {
        Self {
            started,
            attempts: 0,
            payload: None,
            last_state: None,
            last_error: None,
        }
    }

    fn observe(&mut self, poll: PollResult<T>) {
        self.payload = poll.payload;
        self.last_state = Some(poll.state);
    }

    fn timed_out(mut self, spec: &WaitSpec<T>) -> WaitOutcome<T> {
        let err = WaitError::Timeout {
            timeout: spec.timeout,
            elapsed: self.started.elapsed(),
            last_state: self.last_state.clone(),
            expected: spec.expected(),
            last_error: self.last_error.take(),
        };
        self.finish(spec, Some(err))
    }

    fn finish(self, spec: &WaitSpec<T>, error: Option<WaitError>) -> WaitOutcome<T> {
        let failure = match (&spec.failure_reason, &self.payload) {
            (Some(inspect), Some(payload)) => inspect(payload),
            _ => None,
        };

        let error = match (error, failure) {
            (None, Some(Failure { state, reason })) => Some(WaitError::Failed { state, reason }),
            (Some(err), Some(failure)) => Some(err.with_last_error(failure.reason)),
            (error, None) => error,
        };

        let elapsed = self.started.elapsed();
        match &error {
            None => info!(
                attempts = self.attempts,
                ?elapsed,
                state = self.last_state.as_deref().unwrap_or(ABSENT),
                "State converged"
            ),
            Some(err) => warn!(attempts = self.attempts, ?elapsed, error = %err, "Wait failed"),
        }

        WaitOutcome {
            payload: self.payload,
            last_state: self.last_state,
            attempts: self.attempts,
            elapsed,
            error,
        }
    }
}

fn judge<T>(spec: &WaitSpec<T>, poll: &PollResult<T>) -> Verdict {
    if spec.target.contains(&poll.state) {
        Verdict::Converged
    } else if poll.is_absent() {
        if spec.target.is_empty() {
            Verdict::Converged
        } else {
            Verdict::Absent
        }
    } else if spec.pending.contains(&poll.state) {
        Verdict::Pending
    } else {
        Verdict::Unexpected
    }
}

/// `base + duration`, saturating at [`FAR_FUTURE`] past `base`.
fn instant_after(base: Instant, duration: Duration) -> Instant {
    base.checked_add(duration)
        .or_else(|| base.checked_add(FAR_FUTURE))
        .unwrap_or(base)
}

async fn pause(cancel: &CancellationToken, wake: Instant, deadline: Instant) -> Result<(), Interrupt> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Interrupt::Cancelled),
        () = sleep_until(wake.min(deadline)) => {}
    }

    if Instant::now() >= deadline {
        Err(Interrupt::Deadline)
    } else {
        Ok(())
    }
}

/// Poll `spec`'s refresh function until the state converges.
///
/// - A target state (or absence, when the target set is empty) ends the wait
///   successfully once seen `continuous_target_occurrence` times in a row.
/// - A pending state or a transient refresh error sleeps and polls again.
/// - Absence with a non-empty target set is tolerated `not_found_checks`
///   times in a row, then fails with [`WaitError::NotFound`].
/// - Any other state fails at once with [`WaitError::UnexpectedState`].
/// - A fatal refresh error fails at once with [`WaitError::Remote`].
/// - The timeout is wall-clock from the start of the call; cancellation of
///   `ctx` interrupts both the refresh call and the sleep.
pub async fn wait<T>(ctx: &WaitContext, spec: &WaitSpec<T>) -> WaitOutcome<T> {
    let started = Instant::now();
    let deadline = instant_after(started, spec.timeout.min(FAR_FUTURE));
    let backoff = spec.backoff.as_ref().unwrap_or(&ctx.backoff);
    let not_found_checks = spec.not_found_checks.unwrap_or(ctx.not_found_checks);
    let cancel = &ctx.cancel;
    let mut run = Run::new(started);

    info!(
        pending = ?spec.pending,
        target = ?spec.target,
        timeout = ?spec.timeout,
        "Waiting for state to converge"
    );

    if !spec.delay.is_zero() {
        debug!(delay = ?spec.delay, "Delaying first refresh");
        match pause(cancel, instant_after(started, spec.delay), deadline).await {
            Ok(()) => {}
            Err(Interrupt::Cancelled) => return run.finish(spec, Some(WaitError::Cancelled)),
            Err(Interrupt::Deadline) => return run.timed_out(spec),
        }
    }

    let mut step = 0u32;
    let mut interval = Duration::ZERO;
    let mut not_found = 0u32;
    let mut occurrences = 0u32;

    loop {
        // The refresh is only issued once the select first polls it
        let issued = AtomicBool::new(false);
        let refresh = async {
            issued.store(true, Ordering::Relaxed);
            (spec.refresh)().await
        };

        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if issued.load(Ordering::Relaxed) {
                    run.attempts += 1;
                }
                return run.finish(spec, Some(WaitError::Cancelled));
            }
            polled = refresh => polled,
            () = sleep_until(deadline) => {
                run.attempts += 1;
                return run.timed_out(spec);
            }
        };
        run.attempts += 1;

        match polled {
            Err(RefreshError::Fatal(source)) => {
                return run.finish(spec, Some(WaitError::Remote(source)));
            }
            Err(RefreshError::Transient(source)) => {
                warn!(attempt = run.attempts, error = %source, "Transient refresh error");
                run.last_error = Some(source.to_string());
                occurrences = 0;
            }
            Ok(poll) => {
                debug!(attempt = run.attempts, state = %poll.state, "Refreshed state");

                match judge(spec, &poll) {
                    Verdict::Converged => {
                        not_found = 0;
                        occurrences += 1;
                        run.observe(poll);
                        if occurrences >= spec.continuous_target_occurrence {
                            return run.finish(spec, None);
                        }
                    }
                    Verdict::Pending => {
                        not_found = 0;
                        occurrences = 0;
                        run.observe(poll);
                    }
                    Verdict::Absent => {
                        occurrences = 0;
                        not_found += 1;
                        run.observe(poll);
                        if not_found > not_found_checks {
                            let err = WaitError::NotFound {
                                retries: not_found,
                                last_error: run.last_error.take(),
                            };
                            return run.finish(spec, Some(err));
                        }
                    }
                    Verdict::Unexpected => {
                        let err = WaitError::UnexpectedState {
                            state: poll.state.clone(),
                            expected: spec.expected(),
                            last_error: run.last_error.take(),
                        };
                        run.observe(poll);
                        return run.finish(spec, Some(err));
                    }
                }
            }
        }

        if Instant::now() >= deadline {
            return run.timed_out(spec);
        }

        // The interval is held, not grown, while a target state has to recur.
        if occurrences == 0 || interval.is_zero() {
            interval = backoff.interval_for(step);
            step = step.saturating_add(1);
        }

        debug!(?interval, "Waiting before next refresh");
        match pause(cancel, instant_after(Instant::now(), interval), deadline).await {
            Ok(()) => {}
            Err(Interrupt::Cancelled) => return run.finish(spec, Some(WaitError::Cancelled)),
            Err(Interrupt::Deadline) => return run.timed_out(spec),
        }
    }
}
