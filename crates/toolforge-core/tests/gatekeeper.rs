// toolforge-core/tests/gatekeeper.rs
// ============================================================================
// Module: Gatekeeper Tests
// Description: Tests for multi-criteria approval decisions and evidence.
// ============================================================================
//! ## Overview
//! Validates required and optional checks, reasoning lines, evidence
//! completeness, and decision immutability.

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

use serde_json::json;
use toolforge_core::CalibrationReport;
use toolforge_core::ClassifiedOperation;
use toolforge_core::DeterminismScore;
use toolforge_core::DeterminismTier;
use toolforge_core::Gatekeeper;
use toolforge_core::GatekeeperConfig;
use toolforge_core::OperationKey;
use toolforge_core::PromotionCandidate;
use toolforge_core::SessionId;
use toolforge_core::Timestamp;
use toolforge_core::ToolName;
use toolforge_core::hashing::DEFAULT_HASH_ALGORITHM;
use toolforge_core::runtime::composite_score;

/// Builds a candidate with the given determinism, frequency, and savings.
fn candidate(determinism: f64, frequency: usize, savings: usize) -> PromotionCandidate {
    let operation = OperationKey::for_invocation(
        DEFAULT_HASH_ALGORITHM,
        &ToolName::new("Read"),
        &json!({"file_path": "/tmp/target"}),
    )
    .unwrap();
    let unique_outputs = if frequency == 0 { 0 } else { 1 };
    PromotionCandidate {
        operation: ClassifiedOperation {
            score: DeterminismScore {
                operation,
                variance_score: 1.0 - determinism,
                observation_count: frequency,
                unique_outputs,
                session_ids: vec![SessionId::new("session-1")],
            },
            determinism,
            tier: DeterminismTier::Deterministic,
        },
        tool_name: ToolName::new("Read"),
        frequency,
        estimated_token_savings: savings,
        composite_score: composite_score(determinism, frequency, savings),
        meets_confidence: true,
    }
}

// ============================================================================
// SECTION: Required Checks
// ============================================================================

/// Tests a strong candidate clears all required checks.
#[test]
fn test_strong_candidate_is_approved() {
    let gatekeeper = Gatekeeper::new(GatekeeperConfig::default());
    let candidate = candidate(1.0, 20, 500);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(decision.approved);
    assert_eq!(decision.reasoning.len(), 3);
    assert!(decision.evidence.determinism.passed);
    assert!(decision.evidence.composite_score.passed);
    assert!(decision.evidence.observation_count.passed);
}

/// Tests a deterministic ten-observation candidate clears a matching bar.
#[test]
fn test_ten_observation_candidate_clears_adjusted_confidence() {
    // Frequency 10 caps the composite blend at 0.825, so the confidence bar
    // must sit at or below that for mid-frequency operations to pass.
    let config = GatekeeperConfig {
        min_confidence: 0.55,
        ..GatekeeperConfig::default()
    };
    let gatekeeper = Gatekeeper::new(config);
    let candidate = candidate(1.0, 10, 6);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(decision.approved);
}

/// Tests rejection cites the observation shortfall (scenario: 10 < 15).
#[test]
fn test_rejection_cites_observation_count() {
    let config = GatekeeperConfig {
        min_confidence: 0.55,
        min_observations: 15,
        ..GatekeeperConfig::default()
    };
    let gatekeeper = Gatekeeper::new(config);
    let candidate = candidate(1.0, 10, 6);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(!decision.approved);
    assert!(!decision.evidence.observation_count.passed);
    let line = decision
        .reasoning
        .iter()
        .find(|line| line.contains("observation count"))
        .unwrap();
    assert!(line.contains("10"));
    assert!(line.contains("15"));
    assert!(line.contains("below"));
}

/// Tests low determinism fails its required check.
#[test]
fn test_low_determinism_is_rejected() {
    let gatekeeper = Gatekeeper::new(GatekeeperConfig::default());
    let candidate = candidate(0.8, 20, 500);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(!decision.approved);
    assert!(!decision.evidence.determinism.passed);
}

// ============================================================================
// SECTION: Optional Checks
// ============================================================================

/// Tests unset optional thresholds never produce failing reasons.
#[test]
fn test_unset_optional_checks_never_fail() {
    let gatekeeper = Gatekeeper::new(GatekeeperConfig::default());
    let weak_calibration = CalibrationReport {
        f1_score: Some(0.01),
        accuracy: Some(0.01),
        mcc: Some(-0.9),
    };
    let candidate = candidate(1.0, 20, 500);

    let decision =
        gatekeeper.evaluate(&candidate, Some(&weak_calibration), Timestamp::Logical(1));
    assert!(decision.approved);
    assert_eq!(decision.evidence.f1_score.passed, None);
    assert_eq!(decision.evidence.accuracy.passed, None);
    assert_eq!(decision.evidence.mcc.passed, None);
    assert!(decision.reasoning.iter().all(|line| !line.contains("below")));
}

/// Tests a configured optional threshold fails on weak calibration.
#[test]
fn test_configured_f1_threshold_fails_on_weak_calibration() {
    let config = GatekeeperConfig {
        min_f1: Some(0.9),
        ..GatekeeperConfig::default()
    };
    let gatekeeper = Gatekeeper::new(config);
    let calibration = CalibrationReport {
        f1_score: Some(0.5),
        accuracy: None,
        mcc: None,
    };
    let candidate = candidate(1.0, 20, 500);

    let decision = gatekeeper.evaluate(&candidate, Some(&calibration), Timestamp::Logical(1));
    assert!(!decision.approved);
    assert_eq!(decision.evidence.f1_score.passed, Some(false));
    assert!(decision.reasoning.iter().any(|line| line.contains("f1 score")));
}

/// Tests a configured threshold with no calibration metric is skipped.
#[test]
fn test_missing_calibration_metric_skips_check() {
    let config = GatekeeperConfig {
        min_f1: Some(0.9),
        ..GatekeeperConfig::default()
    };
    let gatekeeper = Gatekeeper::new(config);
    let candidate = candidate(1.0, 20, 500);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(decision.approved);
    assert_eq!(decision.evidence.f1_score.passed, None);
    assert_eq!(decision.evidence.f1_score.threshold, Some(0.9));
    assert_eq!(decision.evidence.f1_score.actual, None);
}

// ============================================================================
// SECTION: Evidence and Immutability
// ============================================================================

/// Tests the evidence struct always carries thresholds for every check.
#[test]
fn test_evidence_is_complete_for_rejections() {
    let gatekeeper = Gatekeeper::new(GatekeeperConfig::default());
    let candidate = candidate(0.5, 1, 0);

    let decision = gatekeeper.evaluate(&candidate, None, Timestamp::Logical(1));
    assert!(!decision.approved);
    let evidence = &decision.evidence;
    assert!((evidence.determinism.threshold - 0.95).abs() < f64::EPSILON);
    assert!((evidence.composite_score.threshold - 0.85).abs() < f64::EPSILON);
    assert!((evidence.observation_count.threshold - 5.0).abs() < f64::EPSILON);
    assert_eq!(evidence.f1_score.threshold, None);
    assert_eq!(evidence.accuracy.threshold, None);
    assert_eq!(evidence.mcc.threshold, None);
}

/// Tests re-evaluation produces a new decision without mutating the old one.
#[test]
fn test_reevaluation_produces_new_decision() {
    let gatekeeper = Gatekeeper::new(GatekeeperConfig::default());
    let weak = candidate(1.0, 4, 500);
    let strong = candidate(1.0, 20, 500);

    let first = gatekeeper.evaluate(&weak, None, Timestamp::Logical(1));
    let second = gatekeeper.evaluate(&strong, None, Timestamp::Logical(2));

    assert!(!first.approved);
    assert!(second.approved);
    assert_eq!(first.decided_at, Timestamp::Logical(1));
    assert_eq!(second.decided_at, Timestamp::Logical(2));
}
