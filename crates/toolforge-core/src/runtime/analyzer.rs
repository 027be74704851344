// toolforge-core/src/runtime/analyzer.rs
// ============================================================================
// Module: Toolforge Determinism Analyzer
// Description: Output-variance scoring and tier classification per operation.
// Purpose: Decide which operations behave deterministically enough to script.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The analyzer is a pure function over a snapshot of stored batches: it
//! groups complete pairs by operation key, scores output variance, and
//! assigns a determinism tier. Re-analysis is idempotent and safe to run
//! repeatedly against the same snapshot.
//!
//! Variance curve: `0` for a single observation, otherwise
//! `(unique_outputs - 1) / (observation_count - 1)` — exactly `0` when every
//! observation agrees and exactly `1` when every observation differs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::ClassifiedOperation;
use crate::core::DeterminismScore;
use crate::core::DeterminismTier;
use crate::core::OperationKey;
use crate::core::PairStatus;
use crate::core::SessionId;
use crate::core::StoredExecutionBatch;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for determinism analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminismConfig {
    /// Minimum determinism for the `Deterministic` tier.
    pub deterministic_threshold: f64,
    /// Minimum determinism for the `SemiDeterministic` tier.
    pub semi_deterministic_threshold: f64,
    /// Observations required before a classification is trustworthy.
    pub min_sample_size: usize,
}

impl Default for DeterminismConfig {
    fn default() -> Self {
        Self {
            deterministic_threshold: 0.95,
            semi_deterministic_threshold: 0.7,
            min_sample_size: 3,
        }
    }
}

// ============================================================================
// SECTION: Determinism Analyzer
// ============================================================================

/// Scores and classifies operations by output variance.
pub struct DeterminismAnalyzer {
    /// Hash algorithm for operation identity.
    algorithm: HashAlgorithm,
    /// Analyzer configuration.
    config: DeterminismConfig,
}

/// Accumulated observations for one operation key.
struct OperationObservations {
    /// Operation identity.
    operation: OperationKey,
    /// Distinct output hash values.
    output_hashes: BTreeSet<String>,
    /// Number of complete observations.
    observation_count: usize,
    /// Contributing sessions in first-seen order.
    session_ids: Vec<SessionId>,
}

impl DeterminismAnalyzer {
    /// Creates a new determinism analyzer.
    #[must_use]
    pub const fn new(algorithm: HashAlgorithm, config: DeterminismConfig) -> Self {
        Self {
            algorithm,
            config,
        }
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &DeterminismConfig {
        &self.config
    }

    /// Scores and classifies every operation observed in the batches.
    ///
    /// Partial pairs never contribute. Output is ordered by operation key so
    /// repeated analysis of the same snapshot is byte-stable.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when a pair input cannot be canonicalized.
    pub fn analyze(
        &self,
        batches: &[StoredExecutionBatch],
    ) -> Result<Vec<ClassifiedOperation>, HashError> {
        let mut grouped: BTreeMap<String, OperationObservations> = BTreeMap::new();

        for batch in batches {
            for pair in &batch.pairs {
                if pair.status != PairStatus::Complete {
                    continue;
                }
                let Some(output_hash) = pair.output_hash.as_ref() else {
                    continue;
                };
                let operation =
                    OperationKey::for_invocation(self.algorithm, &pair.tool_name, &pair.input)?;
                let entry = grouped.entry(operation.key_string()).or_insert_with(|| {
                    OperationObservations {
                        operation,
                        output_hashes: BTreeSet::new(),
                        observation_count: 0,
                        session_ids: Vec::new(),
                    }
                });
                entry.output_hashes.insert(output_hash.value.clone());
                entry.observation_count += 1;
                if !entry.session_ids.contains(&batch.session_id) {
                    entry.session_ids.push(batch.session_id.clone());
                }
            }
        }

        Ok(grouped.into_values().map(|observations| self.classify(observations)).collect())
    }

    /// Classifies one operation's accumulated observations.
    fn classify(&self, observations: OperationObservations) -> ClassifiedOperation {
        let variance_score =
            variance_score(observations.observation_count, observations.output_hashes.len());
        let determinism = 1.0 - variance_score;
        let tier = self.tier_for(determinism);

        ClassifiedOperation {
            score: DeterminismScore {
                operation: observations.operation,
                variance_score,
                observation_count: observations.observation_count,
                unique_outputs: observations.output_hashes.len(),
                session_ids: observations.session_ids,
            },
            determinism,
            tier,
        }
    }

    /// Maps a determinism value onto its configured tier.
    fn tier_for(&self, determinism: f64) -> DeterminismTier {
        if determinism >= self.config.deterministic_threshold {
            DeterminismTier::Deterministic
        } else if determinism >= self.config.semi_deterministic_threshold {
            DeterminismTier::SemiDeterministic
        } else {
            DeterminismTier::NonDeterministic
        }
    }
}

// ============================================================================
// SECTION: Variance Curve
// ============================================================================

/// Computes the output-variance score for a sample.
///
/// Monotonic in `unique_outputs` for a fixed sample size; `0.0` when the
/// sample has at most one observation or every observation agrees, `1.0`
/// exactly when every observation differs.
#[must_use]
pub fn variance_score(observation_count: usize, unique_outputs: usize) -> f64 {
    if observation_count <= 1 {
        return 0.0;
    }
    let distinct = unique_outputs.clamp(1, observation_count);
    (distinct - 1) as f64 / (observation_count - 1) as f64
}
