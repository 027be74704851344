// toolforge-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Toolforge Promotion Pipeline
// Description: Stage orchestration, lifecycle state machine, and lineage writes.
// Purpose: Execute the capture-to-demotion pipeline as one canonical path.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The promotion pipeline is the single canonical execution path for
//! Toolforge. It owns the lineage graph and the per-operation lifecycle
//! records, invokes the pure stages over snapshots of the execution store,
//! and writes lineage entries at every artifact-producing transition. Data
//! flows strictly forward (capture → analysis → detection → gatekeeping →
//! validation) with one feedback edge: drift-triggered demotion returns an
//! operation to the candidate pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::ArtifactId;
use crate::core::ArtifactKind;
use crate::core::ClassifiedOperation;
use crate::core::DryRunResult;
use crate::core::GatekeeperDecision;
use crate::core::GeneratedScript;
use crate::core::LineageEntry;
use crate::core::OperationKey;
use crate::core::OperationState;
use crate::core::PairStatus;
use crate::core::PipelineStage;
use crate::core::PromotionCandidate;
use crate::core::PromotionRecord;
use crate::core::SessionTranscript;
use crate::core::StoredExecutionBatch;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::core::time::Timestamp;
use crate::interfaces::CalibrationReport;
use crate::interfaces::ExecutionStore;
use crate::interfaces::SandboxExecutor;
use crate::interfaces::StoreError;
use crate::runtime::analyzer::DeterminismAnalyzer;
use crate::runtime::analyzer::DeterminismConfig;
use crate::runtime::capture::CaptureError;
use crate::runtime::capture::ExecutionCapture;
use crate::runtime::detector::DetectorConfig;
use crate::runtime::detector::PromotionDetector;
use crate::runtime::drift::DriftConfig;
use crate::runtime::drift::DriftMonitor;
use crate::runtime::drift::DriftObservation;
use crate::runtime::gatekeeper::Gatekeeper;
use crate::runtime::gatekeeper::GatekeeperConfig;
use crate::runtime::lineage::LineageError;
use crate::runtime::lineage::LineageGraph;
use crate::runtime::validator::ScriptValidator;
use crate::runtime::validator::ValidationError;
use crate::runtime::validator::ValidatorConfig;

// ============================================================================
// SECTION: Pipeline Configuration
// ============================================================================

/// Configuration for the promotion pipeline engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Hash algorithm used for identity and output digests.
    pub hash_algorithm: HashAlgorithm,
    /// Determinism analyzer configuration.
    pub determinism: DeterminismConfig,
    /// Promotion detector configuration.
    pub detector: DetectorConfig,
    /// Gatekeeper configuration.
    pub gatekeeper: GatekeeperConfig,
    /// Script validator configuration.
    pub validator: ValidatorConfig,
    /// Drift monitor configuration.
    pub drift: DriftConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            determinism: DeterminismConfig::default(),
            detector: DetectorConfig::default(),
            gatekeeper: GatekeeperConfig::default(),
            validator: ValidatorConfig::default(),
            drift: DriftConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Promotion pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Capture stage error.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// Execution store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Hashing error.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Script materialization error.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Lineage integrity error.
    #[error(transparent)]
    Lineage(#[from] LineageError),
    /// The operation has no lifecycle record in this pipeline.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    /// The requested lifecycle transition is not legal.
    #[error("invalid transition for {operation}: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Operation whose transition was rejected.
        operation: String,
        /// Current lifecycle state.
        from: OperationState,
        /// Requested lifecycle state.
        to: OperationState,
    },
    /// The operation is not promoted, so drift cannot be checked.
    #[error("operation is not promoted: {0}")]
    NotPromoted(String),
}

// ============================================================================
// SECTION: Promotion Pipeline
// ============================================================================

/// Promotion pipeline engine orchestrating every stage.
pub struct PromotionPipeline<S, X> {
    /// Execution store snapshot source.
    store: S,
    /// Capture stage.
    capture: ExecutionCapture<S>,
    /// Determinism analyzer stage.
    analyzer: DeterminismAnalyzer,
    /// Promotion detector stage.
    detector: PromotionDetector,
    /// Gatekeeper stage.
    gatekeeper: Gatekeeper,
    /// Script validator stage.
    validator: ScriptValidator<X>,
    /// Drift monitor stage.
    drift: DriftMonitor,
    /// Append-only lineage graph.
    lineage: LineageGraph,
    /// Lifecycle records keyed by operation key string.
    records: BTreeMap<String, PromotionRecord>,
    /// Latest gate artifact per operation, for script lineage edges.
    gate_artifacts: BTreeMap<String, ArtifactId>,
    /// Per-namespace artifact sequence counters.
    artifact_seq: BTreeMap<String, usize>,
}

impl<S, X> PromotionPipeline<S, X>
where
    S: ExecutionStore + Clone,
    X: SandboxExecutor,
{
    /// Creates a new promotion pipeline.
    #[must_use]
    pub fn new(store: S, sandbox: X, config: PipelineConfig) -> Self {
        let algorithm = config.hash_algorithm;
        Self {
            capture: ExecutionCapture::new(store.clone(), algorithm),
            store,
            analyzer: DeterminismAnalyzer::new(algorithm, config.determinism),
            detector: PromotionDetector::new(algorithm, config.detector),
            gatekeeper: Gatekeeper::new(config.gatekeeper),
            validator: ScriptValidator::new(sandbox, algorithm, config.validator),
            drift: DriftMonitor::new(algorithm, config.drift),
            lineage: LineageGraph::new(),
            records: BTreeMap::new(),
            gate_artifacts: BTreeMap::new(),
            artifact_seq: BTreeMap::new(),
        }
    }

    /// Returns the lineage graph.
    #[must_use]
    pub const fn lineage(&self) -> &LineageGraph {
        &self.lineage
    }

    /// Returns the lifecycle record for an operation, if any.
    #[must_use]
    pub fn record_for(&self, operation: &OperationKey) -> Option<&PromotionRecord> {
        self.records.get(&operation.key_string())
    }

    /// Returns the drift monitor.
    #[must_use]
    pub const fn drift_monitor(&self) -> &DriftMonitor {
        &self.drift
    }

    // ------------------------------------------------------------------
    // Stage: capture
    // ------------------------------------------------------------------

    /// Captures one session transcript and records observation lineage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when capture or lineage recording fails.
    pub fn ingest(
        &mut self,
        transcript: &SessionTranscript,
        captured_at: Timestamp,
    ) -> Result<StoredExecutionBatch, PipelineError> {
        let batch = self.capture.capture_session(transcript, captured_at)?;

        for pair in &batch.pairs {
            let artifact_id = ArtifactId::new(ArtifactKind::Observation, &pair.pair_id);
            let mut metadata = BTreeMap::new();
            metadata.insert("tool".to_string(), Value::String(pair.tool_name.to_string()));
            metadata.insert(
                "status".to_string(),
                Value::String(
                    match pair.status {
                        PairStatus::Complete => "complete",
                        PairStatus::Partial => "partial",
                    }
                    .to_string(),
                ),
            );
            self.lineage.append(LineageEntry {
                artifact_id,
                artifact_kind: ArtifactKind::Observation,
                stage: PipelineStage::Capture,
                inputs: Vec::new(),
                outputs: Vec::new(),
                metadata,
                recorded_at: captured_at,
            })?;
        }
        Ok(batch)
    }

    // ------------------------------------------------------------------
    // Stage: analysis
    // ------------------------------------------------------------------

    /// Re-analyzes the stored snapshot and records pattern lineage.
    ///
    /// Safe to run repeatedly; re-analysis refreshes each pattern's entry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the snapshot cannot be read or hashed.
    pub fn analyze(
        &mut self,
        analyzed_at: Timestamp,
    ) -> Result<Vec<ClassifiedOperation>, PipelineError> {
        let batches = self.store.read_all()?;
        let classified = self.analyzer.analyze(&batches)?;
        self.record_pattern_lineage(&classified, &batches, analyzed_at)?;
        Ok(classified)
    }

    /// Records one pattern lineage entry per classified operation.
    fn record_pattern_lineage(
        &mut self,
        classified: &[ClassifiedOperation],
        batches: &[StoredExecutionBatch],
        recorded_at: Timestamp,
    ) -> Result<(), PipelineError> {
        for operation in classified {
            let inputs = self.observation_ids(&operation.score.operation, batches)?;
            let artifact_id = ArtifactId::new(
                ArtifactKind::Pattern,
                operation.score.operation.short_string(),
            );
            let mut entry = LineageEntry {
                artifact_id,
                artifact_kind: ArtifactKind::Pattern,
                stage: PipelineStage::Analysis,
                inputs,
                outputs: Vec::new(),
                metadata: BTreeMap::new(),
                recorded_at,
            };
            entry.set_classification(operation.tier);
            entry.metadata.insert(
                "observation_count".to_string(),
                Value::from(operation.score.observation_count),
            );
            self.lineage.append(entry)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stage: detection
    // ------------------------------------------------------------------

    /// Runs detection over the stored snapshot and records candidate lineage.
    ///
    /// Operations previously demoted by drift re-enter the candidate pool
    /// here; operations currently approved or promoted keep their state.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the snapshot cannot be read or hashed.
    pub fn detect(
        &mut self,
        detected_at: Timestamp,
    ) -> Result<Vec<PromotionCandidate>, PipelineError> {
        let batches = self.store.read_all()?;
        let classified = self.analyzer.analyze(&batches)?;
        self.record_pattern_lineage(&classified, &batches, detected_at)?;
        let candidates = self.detector.detect(&classified, &batches)?;

        for candidate in &candidates {
            let operation = &candidate.operation.score.operation;
            let key = operation.key_string();
            let state = self.records.get(&key).map(|record| record.state);
            match state {
                None => {
                    self.records.insert(
                        key.clone(),
                        PromotionRecord::candidate(operation.clone(), detected_at),
                    );
                }
                Some(OperationState::Demoted) => {
                    self.transition(operation, OperationState::Candidate, detected_at)?;
                }
                Some(OperationState::Candidate) => {}
                Some(OperationState::Approved | OperationState::Promoted) => continue,
            }

            let pattern_id =
                ArtifactId::new(ArtifactKind::Pattern, operation.short_string());
            let artifact_id =
                ArtifactId::new(ArtifactKind::Candidate, operation.short_string());
            let mut entry = LineageEntry {
                artifact_id,
                artifact_kind: ArtifactKind::Candidate,
                stage: PipelineStage::Detection,
                inputs: vec![pattern_id],
                outputs: Vec::new(),
                metadata: BTreeMap::new(),
                recorded_at: detected_at,
            };
            entry.set_classification(candidate.operation.tier);
            if let Some(score) = serde_json::Number::from_f64(candidate.composite_score) {
                entry
                    .metadata
                    .insert("composite_score".to_string(), Value::Number(score));
            }
            self.lineage.append(entry)?;
        }
        Ok(candidates)
    }

    // ------------------------------------------------------------------
    // Stage: gatekeeping
    // ------------------------------------------------------------------

    /// Gatekeeps one candidate, records decision lineage, and advances the
    /// lifecycle on approval.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownOperation`] when the candidate never
    /// passed through detection, and [`PipelineError::InvalidTransition`]
    /// when the operation is not in the candidate pool.
    pub fn gate(
        &mut self,
        candidate: &PromotionCandidate,
        calibration: Option<&CalibrationReport>,
        decided_at: Timestamp,
    ) -> Result<GatekeeperDecision, PipelineError> {
        let operation = candidate.operation.score.operation.clone();
        let key = operation.key_string();
        let state = self
            .records
            .get(&key)
            .map(|record| record.state)
            .ok_or_else(|| PipelineError::UnknownOperation(key.clone()))?;
        if state != OperationState::Candidate {
            return Err(PipelineError::InvalidTransition {
                operation: key,
                from: state,
                to: OperationState::Approved,
            });
        }

        let decision = self.gatekeeper.evaluate(candidate, calibration, decided_at);

        let candidate_id =
            ArtifactId::new(ArtifactKind::Candidate, operation.short_string());
        let artifact_id = self.next_artifact_id(ArtifactKind::Gate, &operation);
        let mut metadata = BTreeMap::new();
        metadata.insert("approved".to_string(), Value::Bool(decision.approved));
        metadata.insert(
            "reasoning".to_string(),
            Value::Array(decision.reasoning.iter().cloned().map(Value::String).collect()),
        );
        self.lineage.append(LineageEntry {
            artifact_id: artifact_id.clone(),
            artifact_kind: ArtifactKind::Gate,
            stage: PipelineStage::Gatekeeping,
            inputs: vec![candidate_id],
            outputs: Vec::new(),
            metadata,
            recorded_at: decided_at,
        })?;
        self.gate_artifacts.insert(key, artifact_id);

        if decision.approved {
            self.transition(&operation, OperationState::Approved, decided_at)?;
        }
        Ok(decision)
    }

    // ------------------------------------------------------------------
    // Stage: validation
    // ------------------------------------------------------------------

    /// Materializes and dry-runs the script for an approved candidate,
    /// promoting the operation when the dry run passes.
    ///
    /// A failing dry run blocks promotion and leaves the operation approved;
    /// retrying is the caller's policy.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTransition`] when the operation is not
    /// approved, and [`PipelineError::Validation`] when no observations back
    /// the candidate.
    pub fn validate(
        &mut self,
        candidate: &PromotionCandidate,
        generated_at: Timestamp,
    ) -> Result<(GeneratedScript, DryRunResult), PipelineError> {
        let operation = candidate.operation.score.operation.clone();
        let key = operation.key_string();
        let state = self
            .records
            .get(&key)
            .map(|record| record.state)
            .ok_or_else(|| PipelineError::UnknownOperation(key.clone()))?;
        if state != OperationState::Approved {
            return Err(PipelineError::InvalidTransition {
                operation: key,
                from: state,
                to: OperationState::Promoted,
            });
        }

        let batches = self.store.read_all()?;
        let script = self.validator.materialize(candidate, &batches, generated_at)?;
        let result = self.validator.dry_run(&script);

        let gate_input = self
            .gate_artifacts
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ArtifactId::new(ArtifactKind::Candidate, operation.short_string()));
        let artifact_id = self.next_artifact_id(ArtifactKind::Script, &operation);
        let mut metadata = BTreeMap::new();
        metadata.insert("is_valid".to_string(), Value::Bool(script.is_valid));
        metadata.insert("dry_run_passed".to_string(), Value::Bool(result.passed));
        self.lineage.append(LineageEntry {
            artifact_id: artifact_id.clone(),
            artifact_kind: ArtifactKind::Script,
            stage: PipelineStage::Validation,
            inputs: vec![gate_input],
            outputs: Vec::new(),
            metadata,
            recorded_at: generated_at,
        })?;

        if result.passed {
            self.transition(&operation, OperationState::Promoted, generated_at)?;
            if let Some(record) = self.records.get_mut(&key) {
                record.script_id = Some(artifact_id);
                record.expected_output_hash = script.expected_output_hash.clone();
            }
        }
        Ok((script, result))
    }

    // ------------------------------------------------------------------
    // Stage: monitoring
    // ------------------------------------------------------------------

    /// Checks one live execution of a promoted operation for drift,
    /// demoting on sustained mismatch.
    ///
    /// The demotion decision is computed synchronously in the call that
    /// crosses the sensitivity threshold; the operation then awaits
    /// re-detection to re-enter the candidate pool.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotPromoted`] when the operation is not in
    /// promoted state.
    pub fn observe_execution(
        &mut self,
        operation: &OperationKey,
        live_output: &str,
        observed_at: Timestamp,
    ) -> Result<DriftObservation, PipelineError> {
        let key = operation.key_string();
        let (expected, script_id) = match self.records.get(&key) {
            Some(record) if record.state == OperationState::Promoted => match (
                record.expected_output_hash.clone(),
                record.script_id.clone(),
            ) {
                (Some(expected), Some(script_id)) => (expected, script_id),
                _ => return Err(PipelineError::NotPromoted(key)),
            },
            _ => return Err(PipelineError::NotPromoted(key)),
        };

        let observation = self.drift.observe(operation, &expected, live_output, observed_at);

        let artifact_id = self.next_artifact_id(ArtifactKind::Execution, operation);
        let mut metadata = BTreeMap::new();
        metadata.insert("matched".to_string(), Value::Bool(observation.event.matched));
        metadata.insert(
            "consecutive_mismatches".to_string(),
            Value::from(observation.event.consecutive_mismatches),
        );
        if let Some(demotion) = observation.demotion.as_ref() {
            // This entry closes the operation's active promotion chain.
            metadata.insert("demoted".to_string(), Value::Bool(demotion.demoted));
            metadata.insert("reason".to_string(), Value::String(demotion.reason.clone()));
        }
        self.lineage.append(LineageEntry {
            artifact_id,
            artifact_kind: ArtifactKind::Execution,
            stage: PipelineStage::Monitoring,
            inputs: vec![script_id],
            outputs: Vec::new(),
            metadata,
            recorded_at: observed_at,
        })?;

        if observation.demotion.is_some() {
            self.transition(operation, OperationState::Demoted, observed_at)?;
            if let Some(record) = self.records.get_mut(&key) {
                record.script_id = None;
                record.expected_output_hash = None;
            }
        }
        Ok(observation)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Applies a validated lifecycle transition to an operation record.
    fn transition(
        &mut self,
        operation: &OperationKey,
        to: OperationState,
        at: Timestamp,
    ) -> Result<(), PipelineError> {
        let key = operation.key_string();
        let record = self
            .records
            .get_mut(&key)
            .ok_or_else(|| PipelineError::UnknownOperation(key.clone()))?;
        if !record.state.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition {
                operation: key,
                from: record.state,
                to,
            });
        }
        record.state = to;
        record.updated_at = at;
        Ok(())
    }

    /// Returns observation artifact ids for the pairs backing an operation.
    fn observation_ids(
        &self,
        operation: &OperationKey,
        batches: &[StoredExecutionBatch],
    ) -> Result<Vec<ArtifactId>, HashError> {
        let mut ids = Vec::new();
        for batch in batches {
            for pair in &batch.pairs {
                if pair.status != PairStatus::Complete {
                    continue;
                }
                let key = OperationKey::for_invocation(
                    self.capture.algorithm(),
                    &pair.tool_name,
                    &pair.input,
                )?;
                if key == *operation {
                    ids.push(ArtifactId::new(ArtifactKind::Observation, &pair.pair_id));
                }
            }
        }
        Ok(ids)
    }

    /// Allocates the next sequenced artifact id in a namespace.
    fn next_artifact_id(&mut self, kind: ArtifactKind, operation: &OperationKey) -> ArtifactId {
        let namespace = format!("{}:{}", kind.prefix(), operation.short_string());
        let seq = self.artifact_seq.entry(namespace).or_insert(0);
        *seq += 1;
        ArtifactId::new(kind, format!("{}#{}", operation.short_string(), seq))
    }
}
