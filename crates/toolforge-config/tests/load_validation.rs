// toolforge-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate file loading, parsing, and fail-closed behavior.
// Purpose: Ensure malformed or oversized files never produce a config.
// ============================================================================
//! ## Overview
//! Exercises the disk loading path with temporary files: happy path,
//! overrides, parse failures, invalid values, and missing files.

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

use std::fs;
use std::path::PathBuf;

use toolforge_config::ConfigError;
use toolforge_config::ToolforgeConfig;

fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolforge.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Tests a minimal file loads with defaults applied.
#[test]
fn test_minimal_file_loads() {
    let (_dir, path) = write_config("[drift]\nsensitivity = 5\n");
    let config = ToolforgeConfig::load(Some(&path)).unwrap();
    assert_eq!(config.drift.sensitivity, 5);
    assert_eq!(config.gatekeeper.min_observations, 5);
}

/// Tests section overrides survive the round trip into core configs.
#[test]
fn test_overrides_reach_core_config() {
    let (_dir, path) = write_config(
        "[gatekeeper]\nmin_confidence = 0.6\nmin_f1 = 0.9\n\n[validator]\ntimeout_ms = 1000\n",
    );
    let config = ToolforgeConfig::load(Some(&path)).unwrap();
    let pipeline = config.to_pipeline_config();
    assert!((pipeline.gatekeeper.min_confidence - 0.6).abs() < f64::EPSILON);
    assert_eq!(pipeline.gatekeeper.min_f1, Some(0.9));
    assert_eq!(pipeline.validator.timeout_ms, 1000);
}

/// Tests malformed TOML fails with a parse error.
#[test]
fn test_malformed_toml_fails_closed() {
    let (_dir, path) = write_config("[gatekeeper\nmin_confidence = ");
    match ToolforgeConfig::load(Some(&path)) {
        Err(ConfigError::Parse(_)) => {}
        other => panic!("expected parse error, got {other:?}"),
    }
}

/// Tests unknown values fail validation after parsing.
#[test]
fn test_invalid_values_fail_closed() {
    let (_dir, path) = write_config("[drift]\nsensitivity = 0\n");
    match ToolforgeConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) => {
            assert!(message.contains("drift.sensitivity"));
        }
        other => panic!("expected invalid config, got {other:?}"),
    }
}

/// Tests a missing file surfaces an io error.
#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match ToolforgeConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => {}
        other => panic!("expected io error, got {other:?}"),
    }
}
