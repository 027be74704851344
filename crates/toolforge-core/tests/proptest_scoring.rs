// toolforge-core/tests/proptest_scoring.rs
// ============================================================================
// Module: Scoring Property-Based Tests
// Description: Property tests for variance and composite-score invariants.
// Purpose: Detect invariant violations across wide input ranges.
// ============================================================================

//! Property-based tests for scoring invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use toolforge_core::runtime::composite_score;
use toolforge_core::runtime::variance_score;

proptest! {
    #[test]
    fn variance_is_bounded(observations in 0_usize .. 10_000, unique in 0_usize .. 10_000) {
        let score = variance_score(observations, unique);
        prop_assert!((0.0 ..= 1.0).contains(&score));
    }

    #[test]
    fn determinism_and_variance_sum_to_one(
        observations in 0_usize .. 10_000,
        unique in 0_usize .. 10_000,
    ) {
        let variance = variance_score(observations, unique);
        let determinism = 1.0 - variance;
        prop_assert!((determinism + variance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn variance_is_monotonic_in_unique_outputs(
        observations in 2_usize .. 1_000,
        unique in 1_usize .. 999,
    ) {
        prop_assume!(unique < observations);
        let lower = variance_score(observations, unique);
        let higher = variance_score(observations, unique + 1);
        prop_assert!(higher >= lower);
    }

    #[test]
    fn composite_score_is_bounded(
        determinism in 0.0_f64 ..= 1.0,
        frequency in 0_usize .. 100_000,
        savings in 0_usize .. 100_000,
    ) {
        let score = composite_score(determinism, frequency, savings);
        prop_assert!((0.0 ..= 1.0).contains(&score));
    }

    #[test]
    fn composite_score_is_monotonic_in_determinism(
        low in 0.0_f64 ..= 1.0,
        high in 0.0_f64 ..= 1.0,
        frequency in 0_usize .. 1_000,
        savings in 0_usize .. 10_000,
    ) {
        prop_assume!(low <= high);
        let below = composite_score(low, frequency, savings);
        let above = composite_score(high, frequency, savings);
        prop_assert!(above >= below);
    }

    #[test]
    fn composite_score_is_monotonic_in_frequency(
        determinism in 0.0_f64 ..= 1.0,
        frequency in 0_usize .. 10_000,
        step in 0_usize .. 100,
        savings in 0_usize .. 10_000,
    ) {
        let below = composite_score(determinism, frequency, savings);
        let above = composite_score(determinism, frequency + step, savings);
        prop_assert!(above >= below);
    }

    #[test]
    fn composite_score_is_monotonic_in_savings(
        determinism in 0.0_f64 ..= 1.0,
        frequency in 0_usize .. 10_000,
        savings in 0_usize .. 10_000,
        step in 0_usize .. 1_000,
    ) {
        let below = composite_score(determinism, frequency, savings);
        let above = composite_score(determinism, frequency, savings + step);
        prop_assert!(above >= below);
    }
}
