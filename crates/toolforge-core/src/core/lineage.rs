// toolforge-core/src/core/lineage.rs
// ============================================================================
// Module: Toolforge Lineage Records
// Description: Pipeline stages and append-only lineage entries.
// Purpose: Record every artifact transition for provenance queries.
// Dependencies: crate::core::{identifiers, operation, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every stage appends one lineage entry per artifact it produces, naming its
//! upstream inputs and downstream outputs by namespaced artifact id. The
//! graph is a side audit log: it is written by every stage and read by none
//! of them at decision time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ArtifactId;
use crate::core::identifiers::ArtifactKind;
use crate::core::operation::DeterminismTier;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Pipeline Stages
// ============================================================================

/// Pipeline stage that produced a lineage entry.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Execution capture and identity.
    Capture,
    /// Determinism analysis.
    Analysis,
    /// Promotion detection.
    Detection,
    /// Gatekeeping.
    Gatekeeping,
    /// Script validation.
    Validation,
    /// Drift monitoring.
    Monitoring,
}

// ============================================================================
// SECTION: Lineage Entries
// ============================================================================

/// Metadata key under which an entry records its determinism tier.
pub const CLASSIFICATION_METADATA_KEY: &str = "classification";

/// One stage's record of an artifact and its provenance edges.
///
/// # Invariants
/// - Append-only; never mutated or deleted.
/// - `inputs` reference artifacts already recorded in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEntry {
    /// Namespaced artifact identifier.
    pub artifact_id: ArtifactId,
    /// Artifact kind, matching the identifier's namespace.
    pub artifact_kind: ArtifactKind,
    /// Stage that produced the artifact.
    pub stage: PipelineStage,
    /// Upstream artifact identifiers consumed by this artifact.
    pub inputs: Vec<ArtifactId>,
    /// Downstream artifact identifiers this artifact feeds.
    pub outputs: Vec<ArtifactId>,
    /// Free-form stage metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Record timestamp supplied by the caller.
    pub recorded_at: Timestamp,
}

impl LineageEntry {
    /// Returns the determinism tier recorded in the entry metadata, if any.
    #[must_use]
    pub fn classification(&self) -> Option<DeterminismTier> {
        let value = self.metadata.get(CLASSIFICATION_METADATA_KEY)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Records a determinism tier in the entry metadata.
    pub fn set_classification(&mut self, tier: DeterminismTier) {
        if let Ok(value) = serde_json::to_value(tier) {
            self.metadata.insert(CLASSIFICATION_METADATA_KEY.to_string(), value);
        }
    }
}
