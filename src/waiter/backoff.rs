//! Poll interval policies for the convergence waiter.
//!
//! The waiter sleeps between refreshes for an interval computed from a
//! [`BackoffPolicy`]:
//! - Constant, linear, exponential or fibonacci growth from `initial_interval`
//! - A hard cap (`max_interval`) and floor (`min_interval`)
//! - Optional jitter so concurrent waits against one API spread out
//! - A fixed `poll_interval` that overrides growth entirely
//!
//! # Example
//!
//! ```rust
//! use stateconf::waiter::backoff::{BackoffPolicy, BackoffStrategy, JitterStrategy};
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::builder()
//!     .initial_interval(Duration::from_millis(500))
//!     .max_interval(Duration::from_secs(10))
//!     .strategy(BackoffStrategy::Exponential { multiplier: 2.0 })
//!     .jitter(JitterStrategy::Equal)
//!     .build();
//!
//! assert!(policy.interval_for(10) <= Duration::from_secs(10));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Growth strategy for the interval between polls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackoffStrategy {
    /// Same interval every time.
    Constant,

    /// interval = initial * (step + 1)
    Linear,

    /// interval = initial * multiplier^step
    Exponential {
        /// Growth factor (default: 2.0)
        multiplier: f64,
    },

    /// interval = initial * fib(step + 1)
    Fibonacci,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential { multiplier: 2.0 }
    }
}

impl BackoffStrategy {
    /// Raw interval for a 0-indexed sleep step, before capping and jitter.
    pub fn calculate(&self, step: u32, initial: Duration) -> Duration {
        let base_millis = initial.as_millis() as f64;

        let millis = match self {
            Self::Constant => base_millis,
            Self::Linear => base_millis * (f64::from(step) + 1.0),
            Self::Exponential { multiplier } => base_millis * multiplier.powf(f64::from(step)),
            Self::Fibonacci => base_millis * fibonacci(step + 1) as f64,
        };

        // float -> int casts saturate, so runaway growth lands on u64::MAX
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }

    let mut prev = 0u64;
    let mut curr = 1u64;

    for _ in 2..=n {
        let next = prev.saturating_add(curr);
        prev = curr;
        curr = next;
    }

    curr
}

/// Randomization applied to a capped interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum JitterStrategy {
    /// Use the computed interval as is.
    #[default]
    None,

    /// Uniform in `[0, interval)`.
    Full,

    /// `interval / 2` plus uniform in `[0, interval / 2)`.
    Equal,

    /// `interval * (1 + r)` with `r` uniform in `[-percentage, +percentage)`.
    Bounded {
        /// Fraction of the interval used as the jitter range (0.0 to 1.0)
        percentage: f64,
    },
}

impl JitterStrategy {
    /// Apply jitter to an interval.
    pub fn apply(&self, interval: Duration) -> Duration {
        let millis = interval.as_millis() as f64;
        let mut rng = rand::thread_rng();

        let jittered = match self {
            Self::None => millis,
            Self::Full => {
                if millis > 0.0 {
                    rng.gen_range(0.0..millis)
                } else {
                    0.0
                }
            }
            Self::Equal => {
                let half = millis / 2.0;
                if half > 0.0 {
                    half + rng.gen_range(0.0..half)
                } else {
                    0.0
                }
            }
            Self::Bounded { percentage } => {
                let range = millis * percentage.clamp(0.0, 1.0);
                if range > 0.0 {
                    millis + rng.gen_range(-range..range)
                } else {
                    millis
                }
            }
        };

        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

/// How long the waiter sleeps between polls.
///
/// Defaults match the classic state-change poller: start at 100ms, double
/// every step, never exceed 10s, no jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Interval before the first growth step.
    #[serde(with = "humantime_serde")]
    pub initial_interval: Duration,

    /// Upper bound on any single interval, jitter included.
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,

    /// Lower bound on any single interval.
    #[serde(with = "humantime_serde")]
    pub min_interval: Duration,

    /// Fixed interval. When set, growth, cap and floor are ignored.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<Duration>,

    /// Growth strategy.
    pub strategy: BackoffStrategy,

    /// Jitter strategy.
    pub jitter: JitterStrategy,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
            min_interval: Duration::ZERO,
            poll_interval: None,
            strategy: BackoffStrategy::default(),
            jitter: JitterStrategy::None,
        }
    }
}

impl BackoffPolicy {
    /// Create a new policy builder.
    pub fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder::new()
    }

    /// Poll at exactly `interval`, every time.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            poll_interval: Some(interval),
            ..Default::default()
        }
    }

    /// Exponential growth between `initial` and `max`, no jitter.
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            initial_interval: initial,
            max_interval: max,
            ..Default::default()
        }
    }

    /// Interval for the 0-indexed sleep `step`.
    ///
    /// The result is never above `max_interval` and never below
    /// `min_interval`, jitter included.
    pub fn interval_for(&self, step: u32) -> Duration {
        if let Some(fixed) = self.poll_interval {
            return fixed;
        }

        let raw = self.strategy.calculate(step, self.initial_interval);
        let capped = raw.min(self.max_interval);
        self.jitter
            .apply(capped)
            .min(self.max_interval)
            .max(self.min_interval)
    }
}

/// Builder for [`BackoffPolicy`].
#[derive(Debug, Clone, Default)]
pub struct BackoffPolicyBuilder {
    policy: BackoffPolicy,
}

impl BackoffPolicyBuilder {
    /// Create a builder starting from the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial interval.
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.policy.initial_interval = interval;
        self
    }

    /// Set the interval cap.
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.policy.max_interval = interval;
        self
    }

    /// Set the interval floor.
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.policy.min_interval = interval;
        self
    }

    /// Use a fixed interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.policy.poll_interval = Some(interval);
        self
    }

    /// Set the growth strategy.
    pub fn strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.policy.strategy = strategy;
        self
    }

    /// Set the jitter strategy.
    pub fn jitter(mut self, jitter: JitterStrategy) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Build the policy.
    pub fn build(self) -> BackoffPolicy {
        self.policy
    }
}
