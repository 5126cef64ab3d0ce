#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use fiber_cause::{Cause, FiberId};
use proptest::prelude::*;
use proptest::test_runner::RngSeed;
use std::collections::BTreeSet;
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

const PROPTEST_SEED_ENV: &str = "FIBER_CAUSE_PROPTEST_SEED";
const PROPTEST_MAX_SHRINK_ITERS_ENV: &str = "FIBER_CAUSE_PROPTEST_MAX_SHRINK_ITERS";

/// Configuration for property tests with optional deterministic seed support.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Fixed seed for reproducibility (overrides CI default when set).
    pub seed: Option<u64>,
    /// Number of successful cases required.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropertyTestConfig {
    /// Build a config with defaults for property tests.
    #[must_use]
    pub fn new(cases: u32) -> Self {
        Self {
            seed: read_proptest_seed(),
            cases,
            max_shrink_iters: read_max_shrink_iters()
                .unwrap_or(ProptestConfig::default().max_shrink_iters),
        }
    }

    /// Convert into a ProptestConfig, applying deterministic seed rules.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        let mut config = ProptestConfig::with_cases(self.cases);

        // Honor existing PROPTEST_RNG_SEED, otherwise apply our own.
        if matches!(config.rng_seed, RngSeed::Random) {
            if let Some(seed) = self.seed {
                config.rng_seed = RngSeed::Fixed(seed);
            }
        }

        config.max_shrink_iters = self.max_shrink_iters;
        config
    }
}

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    PropertyTestConfig::new(cases).to_proptest_config()
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }

    // If CI is set and no explicit seed is provided, use a fixed seed.
    if std::env::var("CI").is_ok() {
        return Some(DEFAULT_PROPTEST_SEED);
    }

    None
}

fn read_max_shrink_iters() -> Option<u32> {
    std::env::var(PROPTEST_MAX_SHRINK_ITERS_ENV)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
}

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}

/// A runtime fiber id started at time zero.
#[must_use]
pub fn fid(id: u64) -> FiberId {
    FiberId::new_for_test(id)
}

// ============================================================================
// Strategies
// ============================================================================

/// A single failure leaf. Payload ranges are small so that generated trees
/// share leaves often.
pub fn arb_leaf() -> impl Strategy<Value = Cause<u8>> {
    prop_oneof![
        (0u8..8).prop_map(Cause::fail),
        (0u8..4).prop_map(|n| Cause::die(format!("defect-{n}"))),
        (1u64..4).prop_map(|n| Cause::interrupt(fid(n))),
    ]
}

/// A leaf, or `Empty` bare or under a `Stackless` wrapper.
pub fn arb_atom() -> impl Strategy<Value = Cause<u8>> {
    prop_oneof![
        6 => arb_leaf(),
        1 => Just(Cause::Empty),
        1 => Just(Cause::stackless(Cause::Empty)),
    ]
}

/// Builds a `Then` node directly, without collapsing empty operands.
#[must_use]
pub fn raw_then(left: Cause<u8>, right: Cause<u8>) -> Cause<u8> {
    Cause::Then {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Builds a `Both` node directly, without collapsing empty operands.
#[must_use]
pub fn raw_both(left: Cause<u8>, right: Cause<u8>) -> Cause<u8> {
    Cause::Both {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// A cause tree of bounded depth, possibly leafless.
///
/// Mixes smart constructors with raw nodes, so empty operands survive in
/// any position.
pub fn arb_raw_cause() -> impl Strategy<Value = Cause<u8>> {
    arb_atom().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Cause::then(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Cause::both(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| raw_then(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| raw_both(l, r)),
            inner.prop_map(Cause::stackless),
        ]
    })
}

/// A cause tree of bounded depth with at least one failure leaf.
pub fn arb_cause() -> impl Strategy<Value = Cause<u8>> {
    arb_raw_cause().prop_filter("needs a failure leaf", |cause| !cause.is_empty())
}

/// One local rewrite by a law of the algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// `a||b` to `b||a`.
    Commute,
    /// `(a;b);c` to `a;(b;c)` and back, likewise for `||`.
    Reassociate,
    /// `a;(b||c)` to `(a;b)||(a;c)`.
    DistributeLeft,
    /// `(a||b);c` to `(a;c)||(b;c)`.
    DistributeRight,
    /// `x` to `Stackless(Empty);(x||Empty)`.
    PadEmpty,
    /// `x` to `Stackless(x)`.
    Wrap,
}

/// Any [`Rewrite`].
pub fn arb_rewrite() -> impl Strategy<Value = Rewrite> {
    prop_oneof![
        Just(Rewrite::Commute),
        Just(Rewrite::Reassociate),
        Just(Rewrite::DistributeLeft),
        Just(Rewrite::DistributeRight),
        Just(Rewrite::PadEmpty),
        Just(Rewrite::Wrap),
    ]
}

/// Applies `rewrite` at the `target`-th node of `cause` in pre-order
/// (modulo the node count). Returns a clone when the law does not match
/// there.
///
/// With `guarded`, distribution is skipped when a distributed branch has no
/// failure leaf, since the law does not hold for such branches.
#[must_use]
pub fn rewrite_at(
    cause: &Cause<u8>,
    target: usize,
    rewrite: Rewrite,
    guarded: bool,
) -> Cause<u8> {
    let nodes = cause.reduce_left(0usize, |count, _| Some(count + 1));
    let mut remaining = Some(target % nodes);
    rewrite_node(cause, &mut remaining, rewrite, guarded)
}

fn rewrite_node(
    cause: &Cause<u8>,
    remaining: &mut Option<usize>,
    rewrite: Rewrite,
    guarded: bool,
) -> Cause<u8> {
    match *remaining {
        Some(0) => {
            *remaining = None;
            return apply(cause, rewrite, guarded).unwrap_or_else(|| cause.clone());
        }
        Some(n) => *remaining = Some(n - 1),
        None => return cause.clone(),
    }
    match cause {
        Cause::Then { left, right } => {
            let left = rewrite_node(left, remaining, rewrite, guarded);
            raw_then(left, rewrite_node(right, remaining, rewrite, guarded))
        }
        Cause::Both { left, right } => {
            let left = rewrite_node(left, remaining, rewrite, guarded);
            raw_both(left, rewrite_node(right, remaining, rewrite, guarded))
        }
        Cause::Stackless { cause, stackless } => Cause::Stackless {
            cause: Box::new(rewrite_node(cause, remaining, rewrite, guarded)),
            stackless: *stackless,
        },
        leaf => leaf.clone(),
    }
}

fn cloned(node: &Cause<u8>) -> Cause<u8> {
    node.clone()
}

fn apply(cause: &Cause<u8>, rewrite: Rewrite, guarded: bool) -> Option<Cause<u8>> {
    let occupied =
        |branches: [&Cause<u8>; 2]| !guarded || branches.iter().all(|branch| !branch.is_empty());
    match (rewrite, cause) {
        (Rewrite::Commute, Cause::Both { left, right }) => {
            Some(raw_both(cloned(right), cloned(left)))
        }
        (Rewrite::Reassociate, Cause::Then { left, right }) => match (&**left, &**right) {
            (Cause::Then { left: a, right: b }, c) => {
                Some(raw_then(cloned(a), raw_then(cloned(b), cloned(c))))
            }
            (a, Cause::Then { left: b, right: c }) => {
                Some(raw_then(raw_then(cloned(a), cloned(b)), cloned(c)))
            }
            _ => None,
        },
        (Rewrite::Reassociate, Cause::Both { left, right }) => match (&**left, &**right) {
            (Cause::Both { left: a, right: b }, c) => {
                Some(raw_both(cloned(a), raw_both(cloned(b), cloned(c))))
            }
            (a, Cause::Both { left: b, right: c }) => {
                Some(raw_both(raw_both(cloned(a), cloned(b)), cloned(c)))
            }
            _ => None,
        },
        (Rewrite::DistributeLeft, Cause::Then { left: a, right }) => match &**right {
            Cause::Both { left: b, right: c } if occupied([&**b, &**c]) => Some(raw_both(
                raw_then(cloned(a), cloned(b)),
                raw_then(cloned(a), cloned(c)),
            )),
            _ => None,
        },
        (Rewrite::DistributeRight, Cause::Then { left, right: c }) => match &**left {
            Cause::Both { left: a, right: b } if occupied([&**a, &**b]) => Some(raw_both(
                raw_then(cloned(a), cloned(c)),
                raw_then(cloned(b), cloned(c)),
            )),
            _ => None,
        },
        (Rewrite::PadEmpty, x) => Some(raw_then(
            Cause::stackless(Cause::Empty),
            raw_both(x.clone(), Cause::Empty),
        )),
        (Rewrite::Wrap, x) => Some(Cause::stackless(x.clone())),
        _ => None,
    }
}

/// Stage-by-stage leaf renderings of `cause.flatten()`, as sets.
#[must_use]
pub fn stage_sets(cause: &Cause<u8>) -> Vec<BTreeSet<String>> {
    cause
        .flatten()
        .into_iter()
        .map(|stage| {
            stage
                .into_iter()
                .map(|leaf| match leaf {
                    Cause::Fail { value, .. } => format!("fail:{value}"),
                    Cause::Die { defect, .. } => format!("die:{}", defect.message()),
                    Cause::Interrupt { fiber_id, .. } => format!("interrupt:{fiber_id}"),
                    other => format!("unexpected:{other:?}"),
                })
                .collect()
        })
        .collect()
}
