// toolforge-core/src/core/operation.rs
// ============================================================================
// Module: Toolforge Operation Identity
// Description: Operation keys, determinism scores, and tier classification.
// Purpose: Give repeated tool invocations a stable identity and variance stats.
// Dependencies: crate::core::{hashing, identifiers}, serde, serde_json
// ============================================================================

//! ## Overview
//! An operation is a (tool, canonical-input) pair treated as one repeatable
//! unit of work. The key is derived by hashing the canonical JSON form of the
//! input, so identity is content-addressed and never persisted standalone.
//! Determinism scores aggregate output variance across every complete
//! observation of an operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::ToolName;

// ============================================================================
// SECTION: Operation Key
// ============================================================================

/// Identity of a repeatable operation.
///
/// # Invariants
/// - Globally stable for identical (tool name, canonical JSON input).
/// - Derived on demand; never persisted as a standalone record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationKey {
    /// Tool name for the operation.
    pub tool_name: ToolName,
    /// Canonical hash of the tool input.
    pub input_hash: HashDigest,
}

impl OperationKey {
    /// Derives the operation key for a tool invocation.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the input cannot be canonicalized.
    pub fn for_invocation(
        algorithm: HashAlgorithm,
        tool_name: &ToolName,
        input: &Value,
    ) -> Result<Self, HashError> {
        let input_hash = hash_canonical_json(algorithm, input)?;
        Ok(Self {
            tool_name: tool_name.clone(),
            input_hash,
        })
    }

    /// Returns the stable map-key form `tool/inputhash`.
    #[must_use]
    pub fn key_string(&self) -> String {
        format!("{}/{}", self.tool_name, self.input_hash.value)
    }

    /// Returns a short human-auditable form `tool/hexprefix` for artifact ids.
    #[must_use]
    pub fn short_string(&self) -> String {
        format!("{}/{}", self.tool_name, self.input_hash.short())
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tool_name, self.input_hash.short())
    }
}

// ============================================================================
// SECTION: Determinism Tiers
// ============================================================================

/// Determinism tier assigned by the analyzer.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeterminismTier {
    /// Output is stable across observations.
    Deterministic,
    /// Output is mostly stable with some variance.
    SemiDeterministic,
    /// Output varies across observations.
    NonDeterministic,
}

impl DeterminismTier {
    /// Returns the tier ordering (higher is more certain).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::NonDeterministic => 0,
            Self::SemiDeterministic => 1,
            Self::Deterministic => 2,
        }
    }

    /// Returns the less certain of two tiers.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        if self.rank() <= other.rank() { self } else { other }
    }
}

// ============================================================================
// SECTION: Determinism Scores
// ============================================================================

/// Aggregate output-variance statistics for one operation key.
///
/// # Invariants
/// - `variance_score` is within `[0.0, 1.0]`.
/// - Partial pairs never contribute to `observation_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterminismScore {
    /// Operation identity the statistics belong to.
    pub operation: OperationKey,
    /// Output variance in `[0, 1]`; `0` means every observation agreed.
    pub variance_score: f64,
    /// Number of complete observations aggregated.
    pub observation_count: usize,
    /// Number of distinct output hashes observed.
    pub unique_outputs: usize,
    /// Sessions that contributed observations, in first-seen order.
    pub session_ids: Vec<SessionId>,
}

/// Determinism score with its derived tier.
///
/// # Invariants
/// - `determinism + score.variance_score == 1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedOperation {
    /// Underlying variance statistics.
    pub score: DeterminismScore,
    /// Determinism measure, `1 - variance_score`.
    pub determinism: f64,
    /// Tier derived from configured thresholds.
    pub tier: DeterminismTier,
}

impl ClassifiedOperation {
    /// Returns true when enough observations back the classification.
    ///
    /// Classifications below the analyzer's minimum sample size are
    /// directional only; callers filtering on tier must also apply this check.
    #[must_use]
    pub const fn meets_sample_size(&self, min_sample_size: usize) -> bool {
        self.score.observation_count >= min_sample_size
    }
}
