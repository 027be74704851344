// toolforge-core/src/runtime/detector.rs
// ============================================================================
// Module: Toolforge Promotion Detector
// Description: Candidate filtering, savings estimation, and composite ranking.
// Purpose: Rank deterministic, tool-eligible operations for promotion.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The detector filters classified operations to those deterministic enough
//! to script and invoked through a replayable tool, then ranks survivors by a
//! composite score. Determinism dominates the blend because an
//! automatable-but-occasionally-flaky operation is a correctness risk;
//! frequency and token savings are capped so a single hyper-frequent
//! operation cannot monopolize the ranking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::ClassifiedOperation;
use crate::core::PairStatus;
use crate::core::PromotionCandidate;
use crate::core::StoredExecutionBatch;
use crate::core::ToolName;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::operation::OperationKey;

// ============================================================================
// SECTION: Scoring Constants
// ============================================================================

/// Composite-score weight for determinism.
pub const DETERMINISM_WEIGHT: f64 = 0.4;
/// Composite-score weight for capped frequency.
pub const FREQUENCY_WEIGHT: f64 = 0.35;
/// Composite-score weight for capped token savings.
pub const TOKEN_SAVINGS_WEIGHT: f64 = 0.25;
/// Frequency at which the frequency component saturates.
pub const FREQUENCY_CAP: f64 = 20.0;
/// Token savings at which the savings component saturates.
pub const TOKEN_SAVINGS_CAP: f64 = 500.0;

/// Tools whose operations are replayable as standalone scripts.
pub const PROMOTABLE_TOOLS: [&str; 7] =
    ["Read", "Write", "Bash", "Glob", "Grep", "Edit", "WebFetch"];

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for promotion detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Minimum determinism required to survive filtering.
    pub min_determinism: f64,
    /// Tool names eligible for promotion.
    pub promotable_tools: BTreeSet<ToolName>,
    /// Minimum composite score for the `meets_confidence` flag.
    pub min_composite_score: f64,
    /// Characters per token used for savings estimation.
    pub chars_per_token: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_determinism: 0.95,
            promotable_tools: default_promotable_tools(),
            min_composite_score: 0.0,
            chars_per_token: 4,
        }
    }
}

/// Returns the default promotable tool set.
#[must_use]
pub fn default_promotable_tools() -> BTreeSet<ToolName> {
    PROMOTABLE_TOOLS.iter().map(|name| ToolName::new(*name)).collect()
}

// ============================================================================
// SECTION: Promotion Detector
// ============================================================================

/// Filters and ranks classified operations into promotion candidates.
pub struct PromotionDetector {
    /// Hash algorithm for operation identity.
    algorithm: HashAlgorithm,
    /// Detector configuration.
    config: DetectorConfig,
}

impl PromotionDetector {
    /// Creates a new promotion detector.
    #[must_use]
    pub const fn new(algorithm: HashAlgorithm, config: DetectorConfig) -> Self {
        Self {
            algorithm,
            config,
        }
    }

    /// Returns the detector configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detects promotion candidates among classified operations.
    ///
    /// Output is sorted descending by composite score; ties keep input order.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when a stored pair input cannot be canonicalized.
    pub fn detect(
        &self,
        classified: &[ClassifiedOperation],
        batches: &[StoredExecutionBatch],
    ) -> Result<Vec<PromotionCandidate>, HashError> {
        let mut candidates = Vec::new();

        for operation in classified {
            if operation.determinism < self.config.min_determinism {
                continue;
            }
            if !self.config.promotable_tools.contains(&operation.score.operation.tool_name) {
                continue;
            }

            let savings =
                estimate_token_savings(self.algorithm, &operation.score.operation, batches, self.config.chars_per_token)?;
            let composite_score = composite_score(
                operation.determinism,
                operation.score.observation_count,
                savings,
            );

            candidates.push(PromotionCandidate {
                tool_name: operation.score.operation.tool_name.clone(),
                frequency: operation.score.observation_count,
                estimated_token_savings: savings,
                composite_score,
                meets_confidence: composite_score >= self.config.min_composite_score,
                operation: operation.clone(),
            });
        }

        candidates.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Computes the weighted composite score for a candidate.
///
/// Bounded in `[0, 1]` for determinism in `[0, 1]`; monotonically
/// non-decreasing in determinism, frequency (up to the cap), and token
/// savings (up to the cap).
#[must_use]
pub fn composite_score(determinism: f64, frequency: usize, token_savings: usize) -> f64 {
    let frequency_component = (frequency as f64 / FREQUENCY_CAP).min(1.0);
    let savings_component = (token_savings as f64 / TOKEN_SAVINGS_CAP).min(1.0);
    DETERMINISM_WEIGHT * determinism
        + FREQUENCY_WEIGHT * frequency_component
        + TOKEN_SAVINGS_WEIGHT * savings_component
}

/// Estimates tokens saved per automated invocation of an operation.
///
/// Averages canonical input length plus output length over the operation's
/// stored pairs with non-null output, then divides by the configured
/// characters-per-token with round-half-up integer arithmetic.
///
/// # Errors
///
/// Returns [`HashError`] when a pair input cannot be canonicalized.
pub fn estimate_token_savings(
    algorithm: HashAlgorithm,
    operation: &OperationKey,
    batches: &[StoredExecutionBatch],
    chars_per_token: usize,
) -> Result<usize, HashError> {
    let mut total_chars = 0_usize;
    let mut samples = 0_usize;

    for batch in batches {
        for pair in &batch.pairs {
            if pair.status != PairStatus::Complete {
                continue;
            }
            let Some(output) = pair.output.as_deref() else {
                continue;
            };
            let key = OperationKey::for_invocation(algorithm, &pair.tool_name, &pair.input)?;
            if key != *operation {
                continue;
            }
            total_chars += canonical_json_bytes(&pair.input)?.len() + output.len();
            samples += 1;
        }
    }

    if samples == 0 || chars_per_token == 0 {
        return Ok(0);
    }

    // round((avg_input + avg_output) / chars_per_token) without float drift:
    // round(total / (samples * cpt)) == (2*total + d) / (2*d) for d = samples * cpt.
    let denominator = samples * chars_per_token;
    Ok((2 * total_chars + denominator) / (2 * denominator))
}
