// toolforge-core/src/runtime/gatekeeper.rs
// ============================================================================
// Module: Toolforge Gatekeeper
// Description: Multi-criteria threshold evaluation for promotion candidates.
// Purpose: Produce immutable, evidence-complete approval decisions.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The gatekeeper is a pure, multi-criteria approval function over one
//! candidate at a time. Required checks always run; optional checks run only
//! when both a threshold and a calibration metric are present — an absent
//! threshold or metric skips the check entirely rather than defaulting it to
//! pass. Every decision carries the full evidence struct so a rejection is
//! self-explanatory without re-running the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::CheckOutcome;
use crate::core::DecisionEvidence;
use crate::core::GatekeeperDecision;
use crate::core::OptionalCheckOutcome;
use crate::core::PromotionCandidate;
use crate::core::time::Timestamp;
use crate::interfaces::CalibrationReport;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for gatekeeper evaluation.
///
/// # Invariants
/// - An `Option` threshold left as `None` disables that check entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatekeeperConfig {
    /// Minimum determinism required for approval.
    pub min_determinism: f64,
    /// Minimum composite score required for approval.
    pub min_confidence: f64,
    /// Minimum complete observations required for approval.
    pub min_observations: usize,
    /// Optional minimum F1 score from the calibration report.
    pub min_f1: Option<f64>,
    /// Optional minimum accuracy from the calibration report.
    pub min_accuracy: Option<f64>,
    /// Optional minimum Matthews correlation from the calibration report.
    pub min_mcc: Option<f64>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            min_determinism: 0.95,
            min_confidence: 0.85,
            min_observations: 5,
            min_f1: None,
            min_accuracy: None,
            min_mcc: None,
        }
    }
}

// ============================================================================
// SECTION: Gatekeeper
// ============================================================================

/// Evaluates promotion candidates against configured thresholds.
pub struct Gatekeeper {
    /// Gatekeeper configuration.
    config: GatekeeperConfig,
}

impl Gatekeeper {
    /// Creates a new gatekeeper.
    #[must_use]
    pub const fn new(config: GatekeeperConfig) -> Self {
        Self {
            config,
        }
    }

    /// Returns the gatekeeper configuration.
    #[must_use]
    pub const fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    /// Evaluates one candidate into an immutable decision.
    ///
    /// Re-evaluating the same candidate later produces a new decision; prior
    /// decisions are never mutated.
    #[must_use]
    pub fn evaluate(
        &self,
        candidate: &PromotionCandidate,
        calibration: Option<&CalibrationReport>,
        decided_at: Timestamp,
    ) -> GatekeeperDecision {
        let mut reasoning = Vec::new();

        let determinism = required_check(
            "determinism",
            candidate.operation.determinism,
            self.config.min_determinism,
            &mut reasoning,
        );
        let composite_score = required_check(
            "composite score",
            candidate.composite_score,
            self.config.min_confidence,
            &mut reasoning,
        );
        let observation_count = required_check(
            "observation count",
            candidate.operation.score.observation_count as f64,
            self.config.min_observations as f64,
            &mut reasoning,
        );

        let f1_score = optional_check(
            "f1 score",
            calibration.and_then(|report| report.f1_score),
            self.config.min_f1,
            &mut reasoning,
        );
        let accuracy = optional_check(
            "accuracy",
            calibration.and_then(|report| report.accuracy),
            self.config.min_accuracy,
            &mut reasoning,
        );
        let mcc = optional_check(
            "mcc",
            calibration.and_then(|report| report.mcc),
            self.config.min_mcc,
            &mut reasoning,
        );

        let approved = determinism.passed
            && composite_score.passed
            && observation_count.passed
            && f1_score.passed.unwrap_or(true)
            && accuracy.passed.unwrap_or(true)
            && mcc.passed.unwrap_or(true);

        GatekeeperDecision {
            approved,
            reasoning,
            evidence: DecisionEvidence {
                determinism,
                composite_score,
                observation_count,
                f1_score,
                accuracy,
                mcc,
            },
            candidate: candidate.clone(),
            decided_at,
        }
    }
}

// ============================================================================
// SECTION: Check Helpers
// ============================================================================

/// Evaluates a required check and appends its reasoning line.
fn required_check(
    label: &str,
    actual: f64,
    threshold: f64,
    reasoning: &mut Vec<String>,
) -> CheckOutcome {
    let passed = actual >= threshold;
    reasoning.push(check_line(label, actual, threshold, passed));
    CheckOutcome {
        actual,
        threshold,
        passed,
    }
}

/// Evaluates an optional check, appending a reasoning line only when it ran.
fn optional_check(
    label: &str,
    actual: Option<f64>,
    threshold: Option<f64>,
    reasoning: &mut Vec<String>,
) -> OptionalCheckOutcome {
    let outcome = OptionalCheckOutcome::evaluate(actual, threshold);
    if let (Some(value), Some(minimum), Some(passed)) =
        (outcome.actual, outcome.threshold, outcome.passed)
    {
        reasoning.push(check_line(label, value, minimum, passed));
    }
    outcome
}

/// Formats one reasoning line for an evaluated check.
fn check_line(label: &str, actual: f64, threshold: f64, passed: bool) -> String {
    if passed {
        format!("{label} {actual} meets minimum {threshold}")
    } else {
        format!("{label} {actual} below minimum {threshold}")
    }
}
