//! Property-based tests for Stateconf using proptest.
//!
//! Covers the invariants of the poll backoff, the wait spec validation rules
//! and the waiter's convergence counting over random status sequences.

use proptest::collection::{hash_set, vec};
use proptest::prelude::*;
use std::time::Duration;

use stateconf::waiter::backoff::{BackoffPolicy, BackoffStrategy, JitterStrategy};
use stateconf::waiter::scripted::ScriptedRefresh;
use stateconf::waiter::{refresh_fn, PollResult, SpecError, WaitContext, WaitSpec};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Strategy for generating status labels
fn state_label() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z_]{0,15}").unwrap()
}

fn backoff_strategy() -> impl Strategy<Value = BackoffStrategy> {
    prop_oneof![
        Just(BackoffStrategy::Constant),
        Just(BackoffStrategy::Linear),
        Just(BackoffStrategy::Fibonacci),
        (1.0f64..4.0).prop_map(|multiplier| BackoffStrategy::Exponential { multiplier }),
    ]
}

fn jitter_strategy() -> impl Strategy<Value = JitterStrategy> {
    prop_oneof![
        Just(JitterStrategy::None),
        Just(JitterStrategy::Full),
        Just(JitterStrategy::Equal),
        (0.0f64..1.0).prop_map(|percentage| JitterStrategy::Bounded { percentage }),
    ]
}

/// Strategy for policies whose floor does not exceed their cap
fn backoff_policy() -> impl Strategy<Value = BackoffPolicy> {
    (
        1u64..5_000,
        0u64..1_000,
        1u64..60_000,
        backoff_strategy(),
        jitter_strategy(),
    )
        .prop_map(|(initial, min, max, strategy, jitter)| {
            BackoffPolicy::builder()
                .initial_interval(Duration::from_millis(initial))
                .min_interval(Duration::from_millis(min.min(max)))
                .max_interval(Duration::from_millis(max))
                .strategy(strategy)
                .jitter(jitter)
                .build()
        })
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

// ============================================================================
// Backoff Properties
// ============================================================================

proptest! {
    #[test]
    fn test_interval_within_bounds(policy in backoff_policy(), step in 0u32..200) {
        let interval = policy.interval_for(step);
        prop_assert!(interval <= policy.max_interval);
        prop_assert!(interval >= policy.min_interval);
    }

    #[test]
    fn test_unjittered_growth_is_monotonic(
        initial in 1u64..5_000,
        max in 1u64..600_000,
        strategy in backoff_strategy(),
        step in 0u32..100,
    ) {
        let policy = BackoffPolicy::builder()
            .initial_interval(Duration::from_millis(initial))
            .max_interval(Duration::from_millis(max))
            .strategy(strategy)
            .build();

        prop_assert!(policy.interval_for(step) <= policy.interval_for(step + 1));
    }

    #[test]
    fn test_fixed_interval_ignores_step(millis in 0u64..100_000, step in any::<u32>()) {
        let policy = BackoffPolicy::fixed(Duration::from_millis(millis));
        prop_assert_eq!(policy.interval_for(step), Duration::from_millis(millis));
    }
}

// ============================================================================
// Spec Validation Properties
// ============================================================================

proptest! {
    #[test]
    fn test_overlap_rejected_iff_sets_intersect(
        pending in hash_set(state_label(), 0..6),
        target in hash_set(state_label(), 0..6),
    ) {
        let result = WaitSpec::builder(refresh_fn(|| async { Ok(PollResult::new("X", ())) }))
            .pending(pending.iter().cloned())
            .target(target.iter().cloned())
            .timeout(Duration::from_secs(1))
            .build();

        let overlaps = !pending.is_disjoint(&target);
        match result {
            Ok(_) => prop_assert!(!overlaps),
            Err(SpecError::OverlappingState(state)) => {
                prop_assert!(pending.contains(&state) && target.contains(&state));
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

// ============================================================================
// Waiter Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_pending_run_then_target_converges(
        pending_polls in 0usize..20,
        interval_ms in 1u64..5_000,
    ) {
        let mut steps = vec!["BUILDING"; pending_polls];
        steps.push("READY");
        let script = ScriptedRefresh::parse(&steps.join(",")).unwrap();

        let spec = WaitSpec::builder(script.refresh())
            .pending(["BUILDING"])
            .target(["READY"])
            .timeout(Duration::from_secs(24 * 3600))
            .backoff(BackoffPolicy::fixed(Duration::from_millis(interval_ms)))
            .build()
            .unwrap();

        let outcome = paused_runtime().block_on(spec.wait(&WaitContext::new()));

        prop_assert!(outcome.is_success());
        prop_assert_eq!(outcome.attempts as usize, pending_polls + 1);
        prop_assert_eq!(
            outcome.elapsed,
            Duration::from_millis(interval_ms) * pending_polls as u32
        );
    }

    #[test]
    fn test_unknown_state_always_stops(
        prefix in vec(prop_oneof![Just("BUILDING"), Just("~throttled")], 0..10),
        stray in state_label().prop_filter("not a known label", |s| s != "BUILDING" && s != "READY"),
    ) {
        let mut steps: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        steps.push(stray.clone());
        steps.push("READY".to_string());
        let script = ScriptedRefresh::parse(&steps.join(",")).unwrap();

        let spec = WaitSpec::builder(script.refresh())
            .pending(["BUILDING"])
            .target(["READY"])
            .timeout(Duration::from_secs(3600))
            .backoff(BackoffPolicy::fixed(Duration::from_secs(1)))
            .build()
            .unwrap();

        let outcome = paused_runtime().block_on(spec.wait(&WaitContext::new()));

        prop_assert!(outcome.error().is_some_and(|e| e.is_unexpected_state()));
        prop_assert_eq!(outcome.last_state, Some(stray));
        prop_assert_eq!(script.calls() as usize, prefix.len() + 1);
    }
}
