// toolforge-core/src/core/state.rs
// ============================================================================
// Module: Toolforge Operation Lifecycle
// Description: Explicit promotion state machine per operation.
// Purpose: Make lifecycle transitions first-class instead of scattered flags.
// Dependencies: crate::core::{hashing, identifiers, operation, time}, serde
// ============================================================================

//! ## Overview
//! Every operation moves through an explicit state machine:
//! `Candidate → Approved → Promoted → Demoted → Candidate`. Transitions are
//! validated here and are the only place the pipeline writes lineage entries,
//! so provenance and lifecycle can never disagree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::ArtifactId;
use crate::core::operation::OperationKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Operation States
// ============================================================================

/// Lifecycle state of an operation in the promotion pipeline.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// In the candidate pool awaiting gatekeeping.
    Candidate,
    /// Approved by the gatekeeper, awaiting validation.
    Approved,
    /// Validated and promoted as an automation script.
    Promoted,
    /// Demoted after sustained drift; eligible for re-detection.
    Demoted,
}

impl OperationState {
    /// Returns true when the transition to `next` is legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Candidate, Self::Approved)
                | (Self::Approved, Self::Promoted)
                | (Self::Promoted, Self::Demoted)
                | (Self::Demoted, Self::Candidate)
        )
    }
}

// ============================================================================
// SECTION: Promotion Records
// ============================================================================

/// Current lifecycle record for one operation.
///
/// # Invariants
/// - `expected_output_hash` and `script_id` are present iff `state` is
///   `Promoted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Operation identity.
    pub operation: OperationKey,
    /// Current lifecycle state.
    pub state: OperationState,
    /// Script artifact active while promoted.
    pub script_id: Option<ArtifactId>,
    /// Output hash recorded at promotion time, used by the drift monitor.
    pub expected_output_hash: Option<HashDigest>,
    /// Timestamp of the last state transition.
    pub updated_at: Timestamp,
}

impl PromotionRecord {
    /// Creates a fresh candidate record for an operation.
    #[must_use]
    pub const fn candidate(operation: OperationKey, updated_at: Timestamp) -> Self {
        Self {
            operation,
            state: OperationState::Candidate,
            script_id: None,
            expected_output_hash: None,
            updated_at,
        }
    }
}
