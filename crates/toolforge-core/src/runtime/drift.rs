// toolforge-core/src/runtime/drift.rs
// ============================================================================
// Module: Toolforge Drift Monitor
// Description: Live-vs-expected output checks and sustained-drift demotion.
// Purpose: Demote promoted scripts whose behavior has drifted from history.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The drift monitor compares every live execution of a promoted operation
//! against the output hash recorded at promotion time. Any match resets the
//! consecutive-mismatch counter; reaching the configured sensitivity emits a
//! demotion decision computed synchronously, so a later dry run can never
//! race a stale expected hash. One fewer mismatch never demotes: a single
//! anomalous execution must not discard a validated automation. Disabling
//! monitoring stops counting without discarding history.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::DemotionDecision;
use crate::core::DriftEvent;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_text;
use crate::core::operation::OperationKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for drift monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftConfig {
    /// Consecutive mismatches required to demote.
    pub sensitivity: usize,
    /// Whether mismatch counting and demotion are active.
    pub enabled: bool,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            sensitivity: 3,
            enabled: true,
        }
    }
}

// ============================================================================
// SECTION: Observations
// ============================================================================

/// Outcome of one drift observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftObservation {
    /// The recorded comparison event.
    pub event: DriftEvent,
    /// Demotion decision, present only when sensitivity was reached.
    pub demotion: Option<DemotionDecision>,
}

// ============================================================================
// SECTION: Drift Monitor
// ============================================================================

/// Tracks per-operation drift against promotion-time expectations.
pub struct DriftMonitor {
    /// Hash algorithm for live output digests.
    algorithm: HashAlgorithm,
    /// Drift configuration.
    config: DriftConfig,
    /// Consecutive mismatch counters keyed by operation.
    counters: BTreeMap<String, usize>,
    /// Full event history keyed by operation.
    history: BTreeMap<String, Vec<DriftEvent>>,
}

impl DriftMonitor {
    /// Creates a new drift monitor.
    #[must_use]
    pub const fn new(algorithm: HashAlgorithm, config: DriftConfig) -> Self {
        Self {
            algorithm,
            config,
            counters: BTreeMap::new(),
            history: BTreeMap::new(),
        }
    }

    /// Returns the drift configuration.
    #[must_use]
    pub const fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Returns the recorded event history for an operation.
    #[must_use]
    pub fn history(&self, operation: &OperationKey) -> &[DriftEvent] {
        self.history.get(&operation.key_string()).map_or(&[], Vec::as_slice)
    }

    /// Records one live execution of a promoted operation.
    ///
    /// The demotion decision, when present, is computed synchronously in the
    /// same call that crossed the sensitivity threshold.
    pub fn observe(
        &mut self,
        operation: &OperationKey,
        expected_hash: &HashDigest,
        live_output: &str,
        observed_at: Timestamp,
    ) -> DriftObservation {
        let actual_hash = hash_text(self.algorithm, live_output);
        let matched = actual_hash == *expected_hash;
        let key = operation.key_string();

        let consecutive_mismatches = if self.config.enabled {
            let counter = self.counters.entry(key.clone()).or_insert(0);
            if matched {
                *counter = 0;
            } else {
                *counter += 1;
            }
            *counter
        } else {
            self.counters.get(&key).copied().unwrap_or(0)
        };

        let event = DriftEvent {
            operation: operation.clone(),
            matched,
            actual_hash,
            expected_hash: expected_hash.clone(),
            consecutive_mismatches,
            observed_at,
        };
        self.history.entry(key.clone()).or_default().push(event.clone());

        let demotion = if self.config.enabled
            && !matched
            && consecutive_mismatches >= self.config.sensitivity
        {
            Some(self.demote(&key, operation, consecutive_mismatches, observed_at))
        } else {
            None
        };

        DriftObservation {
            event,
            demotion,
        }
    }

    /// Builds the demotion decision and resets the operation's counter.
    fn demote(
        &mut self,
        key: &str,
        operation: &OperationKey,
        consecutive_mismatches: usize,
        decided_at: Timestamp,
    ) -> DemotionDecision {
        let events = self.history.get(key).map_or_else(Vec::new, |events| {
            let start = events.len().saturating_sub(consecutive_mismatches);
            events[start ..].to_vec()
        });
        // A fresh counter after demotion: the next check starts from zero.
        self.counters.insert(key.to_string(), 0);

        DemotionDecision {
            operation: operation.clone(),
            demoted: true,
            reason: format!(
                "{consecutive_mismatches} consecutive output mismatches reached sensitivity {}",
                self.config.sensitivity
            ),
            consecutive_mismatches,
            events,
            decided_at,
        }
    }
}
