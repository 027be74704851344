// toolforge-core/src/core/candidate.rs
// ============================================================================
// Module: Toolforge Promotion Candidates
// Description: Candidate records, gatekeeper evidence, and decisions.
// Purpose: Capture promotion proposals and their auditable verdicts.
// Dependencies: crate::core::{identifiers, operation, time}, serde
// ============================================================================

//! ## Overview
//! A promotion candidate is a classified operation proposed for automation,
//! ranked by a composite score. The gatekeeper turns one candidate at a time
//! into an immutable decision carrying the full evidence for every check,
//! configured or not, so a rejection is self-explanatory without re-running
//! the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ToolName;
use crate::core::operation::ClassifiedOperation;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Promotion Candidates
// ============================================================================

/// A classified operation proposed for automation.
///
/// # Invariants
/// - `composite_score` is within `[0.0, 1.0]`.
/// - `frequency` equals the operation's complete observation count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCandidate {
    /// Classified operation backing the candidate.
    pub operation: ClassifiedOperation,
    /// Tool name for the operation.
    pub tool_name: ToolName,
    /// Number of complete observations.
    pub frequency: usize,
    /// Estimated tokens saved per automated invocation.
    pub estimated_token_savings: usize,
    /// Weighted blend of determinism, frequency, and token savings.
    pub composite_score: f64,
    /// True when the composite score clears the configured minimum.
    pub meets_confidence: bool,
}

// ============================================================================
// SECTION: Check Evidence
// ============================================================================

/// Evidence for one required gatekeeper check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Observed value.
    pub actual: f64,
    /// Configured threshold.
    pub threshold: f64,
    /// Whether the observed value cleared the threshold.
    pub passed: bool,
}

/// Evidence for one optional gatekeeper check.
///
/// # Invariants
/// - `passed` is `None` iff the check was skipped (threshold or metric absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalCheckOutcome {
    /// Observed value from the calibration report, when present.
    pub actual: Option<f64>,
    /// Configured threshold, when present.
    pub threshold: Option<f64>,
    /// Check result; absent when the check was skipped.
    pub passed: Option<bool>,
}

impl OptionalCheckOutcome {
    /// Returns evidence for a skipped or evaluated optional check.
    #[must_use]
    pub fn evaluate(actual: Option<f64>, threshold: Option<f64>) -> Self {
        let passed = match (actual, threshold) {
            (Some(value), Some(minimum)) => Some(value >= minimum),
            _ => None,
        };
        Self {
            actual,
            threshold,
            passed,
        }
    }
}

/// Full evidence attached to every gatekeeper decision.
///
/// # Invariants
/// - All six check records are always present, configured or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvidence {
    /// Determinism check evidence.
    pub determinism: CheckOutcome,
    /// Composite-score (confidence) check evidence.
    pub composite_score: CheckOutcome,
    /// Observation-count check evidence.
    pub observation_count: CheckOutcome,
    /// Optional F1 check evidence from the calibration report.
    pub f1_score: OptionalCheckOutcome,
    /// Optional accuracy check evidence from the calibration report.
    pub accuracy: OptionalCheckOutcome,
    /// Optional Matthews-correlation check evidence from the calibration report.
    pub mcc: OptionalCheckOutcome,
}

// ============================================================================
// SECTION: Gatekeeper Decisions
// ============================================================================

/// Approve/reject verdict for one promotion candidate.
///
/// # Invariants
/// - Immutable once produced; re-evaluation creates a new decision.
/// - `approved` is true iff every configured check passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatekeeperDecision {
    /// Whether the candidate cleared every configured check.
    pub approved: bool,
    /// One line per evaluated check describing its outcome.
    pub reasoning: Vec<String>,
    /// Full evidence for every check, configured or not.
    pub evidence: DecisionEvidence,
    /// The candidate that was evaluated.
    pub candidate: PromotionCandidate,
    /// Decision timestamp supplied by the caller.
    pub decided_at: Timestamp,
}
