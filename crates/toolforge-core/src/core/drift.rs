// toolforge-core/src/core/drift.rs
// ============================================================================
// Module: Toolforge Drift Records
// Description: Drift events and demotion decisions for promoted scripts.
// Purpose: Capture live-vs-expected comparisons and sustained-drift verdicts.
// Dependencies: crate::core::{hashing, operation, time}, serde
// ============================================================================

//! ## Overview
//! After promotion, every live execution of an operation is compared against
//! the output hash recorded at promotion time. Drift events accumulate a
//! consecutive-mismatch counter; sustained drift produces a demotion decision
//! that closes the promoted lifecycle and returns the operation to the
//! candidate pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::operation::OperationKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Drift Events
// ============================================================================

/// One live-vs-expected comparison for a promoted operation.
///
/// # Invariants
/// - `consecutive_mismatches` resets to 0 on any match.
/// - Events are appended continuously while a script stays promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftEvent {
    /// Operation the event belongs to.
    pub operation: OperationKey,
    /// Whether the live output matched the expected hash.
    pub matched: bool,
    /// Hash of the live output.
    pub actual_hash: HashDigest,
    /// Output hash recorded at promotion time.
    pub expected_hash: HashDigest,
    /// Consecutive mismatch count after this event.
    pub consecutive_mismatches: usize,
    /// Observation timestamp supplied by the caller.
    pub observed_at: Timestamp,
}

// ============================================================================
// SECTION: Demotion Decisions
// ============================================================================

/// Outcome of sustained drift for a promoted operation.
///
/// # Invariants
/// - Terminal for the script's current promoted lifecycle.
/// - `events` holds the mismatch run that triggered the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemotionDecision {
    /// Operation being demoted.
    pub operation: OperationKey,
    /// Whether the operation leaves promoted state.
    pub demoted: bool,
    /// Human-readable demotion reason.
    pub reason: String,
    /// Consecutive mismatches at decision time.
    pub consecutive_mismatches: usize,
    /// The consecutive mismatch events that triggered the decision.
    pub events: Vec<DriftEvent>,
    /// Decision timestamp supplied by the caller.
    pub decided_at: Timestamp,
}
