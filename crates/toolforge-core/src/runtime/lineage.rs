// toolforge-core/src/runtime/lineage.rs
// ============================================================================
// Module: Toolforge Lineage Graph
// Description: Append-only provenance graph with cycle-safe traversal.
// Purpose: Answer upstream/downstream provenance queries across stages.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The lineage graph is a side audit log: every stage appends entries, none
//! reads them at decision time. Appends enforce the one fatal integrity
//! invariant of the pipeline — inputs must reference already-recorded
//! artifacts — because silently accepting a dangling reference would corrupt
//! every future provenance query. Traversals always carry a visited set; the
//! graph is logically a DAG, but cycle safety is a correctness invariant
//! here, not an optimization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::ArtifactId;
use crate::core::DeterminismTier;
use crate::core::LineageEntry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lineage graph errors.
#[derive(Debug, Error)]
pub enum LineageError {
    /// An entry referenced an input artifact that was never recorded.
    #[error("broken lineage: artifact {artifact_id} references missing input {missing_input}")]
    BrokenLineage {
        /// Artifact whose entry carried the dangling reference.
        artifact_id: String,
        /// The input identifier that does not exist.
        missing_input: String,
    },
}

// ============================================================================
// SECTION: Lineage Graph
// ============================================================================

/// Append-only provenance graph over namespaced artifact identifiers.
#[derive(Debug, Default)]
pub struct LineageGraph {
    /// Entries in append order.
    entries: Vec<LineageEntry>,
    /// Index from artifact id to the position of its latest entry.
    index: BTreeMap<String, usize>,
}

impl LineageGraph {
    /// Creates an empty lineage graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[LineageEntry] {
        &self.entries
    }

    /// Returns the latest entry recorded for an artifact, if any.
    ///
    /// Re-recorded artifacts (for example after re-analysis) resolve to their
    /// most recent entry; older entries stay in the append-only log.
    #[must_use]
    pub fn entry_for(&self, artifact_id: &ArtifactId) -> Option<&LineageEntry> {
        self.index.get(artifact_id.as_str()).map(|position| &self.entries[*position])
    }

    /// Appends one lineage entry.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::BrokenLineage`] when an input references an
    /// artifact that was never recorded. This is a data-integrity fault and
    /// must not be ignored.
    pub fn append(&mut self, entry: LineageEntry) -> Result<(), LineageError> {
        for input in &entry.inputs {
            if !self.index.contains_key(input.as_str()) {
                return Err(LineageError::BrokenLineage {
                    artifact_id: entry.artifact_id.to_string(),
                    missing_input: input.to_string(),
                });
            }
        }
        self.index.insert(entry.artifact_id.to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Returns all upstream artifacts of a target, depth-first, no duplicates.
    ///
    /// The target itself is excluded. Safe against accidental cycles.
    #[must_use]
    pub fn upstream(&self, artifact_id: &ArtifactId) -> Vec<ArtifactId> {
        self.traverse(artifact_id, Direction::Upstream)
    }

    /// Returns all downstream artifacts of a target, depth-first, no duplicates.
    ///
    /// The target itself is excluded. Safe against accidental cycles.
    #[must_use]
    pub fn downstream(&self, artifact_id: &ArtifactId) -> Vec<ArtifactId> {
        self.traverse(artifact_id, Direction::Downstream)
    }

    /// Returns the least certain determinism tier across a target and its
    /// upstream chain.
    ///
    /// Entries that carry no classification metadata are ignored; an unknown
    /// target or a chain without any classified artifact defaults
    /// conservatively to [`DeterminismTier::NonDeterministic`].
    #[must_use]
    pub fn worst_tier(&self, artifact_id: &ArtifactId) -> DeterminismTier {
        if self.entry_for(artifact_id).is_none() {
            return DeterminismTier::NonDeterministic;
        }
        let mut chain = vec![artifact_id.clone()];
        chain.extend(self.upstream(artifact_id));

        let mut worst: Option<DeterminismTier> = None;
        for id in &chain {
            let Some(tier) = self.entry_for(id).and_then(LineageEntry::classification) else {
                continue;
            };
            worst = Some(worst.map_or(tier, |current| current.worst(tier)));
        }
        worst.unwrap_or(DeterminismTier::NonDeterministic)
    }

    /// Depth-first traversal over input or output edges with a visited set.
    fn traverse(&self, artifact_id: &ArtifactId, direction: Direction) -> Vec<ArtifactId> {
        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(artifact_id.to_string());
        let mut ordered = Vec::new();
        let mut stack: Vec<ArtifactId> = self.edges(artifact_id, direction);
        stack.reverse();

        while let Some(next) = stack.pop() {
            if !visited.insert(next.to_string()) {
                continue;
            }
            let mut children = self.edges(&next, direction);
            children.reverse();
            stack.extend(children);
            ordered.push(next);
        }
        ordered
    }

    /// Returns the neighbor ids of an artifact in the given direction.
    fn edges(&self, artifact_id: &ArtifactId, direction: Direction) -> Vec<ArtifactId> {
        self.entry_for(artifact_id).map_or_else(Vec::new, |entry| match direction {
            Direction::Upstream => entry.inputs.clone(),
            Direction::Downstream => entry.outputs.clone(),
        })
    }
}

/// Traversal direction over lineage edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Follow `inputs` toward ancestors.
    Upstream,
    /// Follow `outputs` toward descendants.
    Downstream,
}
