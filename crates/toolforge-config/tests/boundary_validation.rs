// toolforge-config/tests/boundary_validation.rs
// ============================================================================
// Module: Config Boundary Validation Tests
// Description: Validate range and consistency checks per section.
// Purpose: Ensure invalid configuration fails closed with clear messages.
// ============================================================================
//! ## Overview
//! Exercises every validation boundary: unit intervals, threshold ordering,
//! minimum counts, timeout ranges, and drift sensitivity limits.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use toolforge_config::ConfigError;
use toolforge_config::ToolforgeConfig;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

// ============================================================================
// SECTION: Determinism Boundaries
// ============================================================================

/// Tests thresholds above one are rejected.
#[test]
fn determinism_threshold_above_one_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.determinism.deterministic_threshold = 1.5;
    assert_invalid(config.validate(), "determinism.deterministic_threshold")
}

/// Tests the semi threshold must not exceed the deterministic threshold.
#[test]
fn semi_threshold_above_deterministic_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.determinism.semi_deterministic_threshold = 0.97;
    assert_invalid(config.validate(), "must not exceed")
}

/// Tests a zero sample size is rejected.
#[test]
fn zero_min_sample_size_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.determinism.min_sample_size = 0;
    assert_invalid(config.validate(), "determinism.min_sample_size")
}

// ============================================================================
// SECTION: Detector Boundaries
// ============================================================================

/// Tests negative determinism thresholds are rejected.
#[test]
fn negative_min_determinism_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.detector.min_determinism = -0.1;
    assert_invalid(config.validate(), "detector.min_determinism")
}

/// Tests a zero chars-per-token divisor is rejected.
#[test]
fn zero_chars_per_token_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.detector.chars_per_token = 0;
    assert_invalid(config.validate(), "detector.chars_per_token")
}

/// Tests an empty promotable tool list is rejected.
#[test]
fn empty_promotable_tools_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.detector.promotable_tools.clear();
    assert_invalid(config.validate(), "detector.promotable_tools")
}

/// Tests empty tool names are rejected.
#[test]
fn blank_promotable_tool_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.detector.promotable_tools.push(String::new());
    assert_invalid(config.validate(), "entries must not be empty")
}

// ============================================================================
// SECTION: Gatekeeper Boundaries
// ============================================================================

/// Tests zero minimum observations are rejected.
#[test]
fn zero_min_observations_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.gatekeeper.min_observations = 0;
    assert_invalid(config.validate(), "gatekeeper.min_observations")
}

/// Tests optional f1 thresholds outside the unit interval are rejected.
#[test]
fn out_of_range_min_f1_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.gatekeeper.min_f1 = Some(1.2);
    assert_invalid(config.validate(), "gatekeeper.min_f1")
}

/// Tests the mcc threshold accepts the full correlation range.
#[test]
fn min_mcc_accepts_negative_values() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.gatekeeper.min_mcc = Some(-0.5);
    config.validate().map_err(|err| err.to_string())
}

/// Tests mcc thresholds below negative one are rejected.
#[test]
fn min_mcc_below_negative_one_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.gatekeeper.min_mcc = Some(-1.5);
    assert_invalid(config.validate(), "gatekeeper.min_mcc")
}

// ============================================================================
// SECTION: Validator and Drift Boundaries
// ============================================================================

/// Tests timeouts below the floor are rejected.
#[test]
fn timeout_below_floor_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.validator.timeout_ms = 50;
    assert_invalid(config.validate(), "validator.timeout_ms")
}

/// Tests timeouts above the ceiling are rejected.
#[test]
fn timeout_above_ceiling_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.validator.timeout_ms = 900_000;
    assert_invalid(config.validate(), "validator.timeout_ms")
}

/// Tests zero drift sensitivity is rejected.
#[test]
fn zero_drift_sensitivity_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.drift.sensitivity = 0;
    assert_invalid(config.validate(), "drift.sensitivity")
}

/// Tests oversized drift sensitivity is rejected.
#[test]
fn oversized_drift_sensitivity_is_invalid() -> TestResult {
    let mut config = ToolforgeConfig::default();
    config.drift.sensitivity = 1_000;
    assert_invalid(config.validate(), "drift.sensitivity")
}
