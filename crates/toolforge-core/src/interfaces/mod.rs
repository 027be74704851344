// toolforge-core/src/interfaces/mod.rs
// ============================================================================
// Module: Toolforge Interfaces
// Description: Backend-agnostic interfaces for storage and sandbox execution.
// Purpose: Define the contract surfaces consumed by the promotion pipeline.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Toolforge integrates with external systems without
//! embedding backend-specific details. The execution store is append-only;
//! the sandbox executor is blocking, cancellable with a timeout, and must not
//! mutate state visible to the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::StoredExecutionBatch;

// ============================================================================
// SECTION: Execution Store
// ============================================================================

/// Execution store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("execution store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("execution store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("execution store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("execution store error: {0}")]
    Store(String),
}

/// Append-only store for captured execution batches.
///
/// Retention is the collaborator's concern; `read_all` returns every batch
/// regardless of age. Physical write serialization (one writer at a time, or
/// a compare-and-append primitive) is also the collaborator's concern.
pub trait ExecutionStore {
    /// Appends a captured batch to the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when appending fails.
    fn append(&self, batch: &StoredExecutionBatch) -> Result<(), StoreError>;

    /// Reads every stored batch in append order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn read_all(&self) -> Result<Vec<StoredExecutionBatch>, StoreError>;
}

// ============================================================================
// SECTION: Sandbox Executor
// ============================================================================

/// Outcome of one sandboxed script execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxOutcome {
    /// Captured standard output.
    pub stdout: String,
    /// Process exit code.
    pub exit_code: i32,
    /// Execution duration in milliseconds.
    pub duration_ms: u64,
}

/// Sandbox executor errors.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The script exceeded the execution timeout.
    #[error("sandbox execution timed out after {0}ms")]
    Timeout(u64),
    /// The sandbox failed to launch the script.
    #[error("sandbox launch failed: {0}")]
    Launch(String),
    /// The sandbox reported an error.
    #[error("sandbox error: {0}")]
    Sandbox(String),
}

/// External sandbox that executes generated scripts.
///
/// Implementations must enforce the timeout and must not mutate shared state
/// visible to the pipeline.
pub trait SandboxExecutor {
    /// Runs a script to completion within the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when the script cannot be executed.
    fn run(&self, script: &str, timeout_ms: u64) -> Result<SandboxOutcome, SandboxError>;
}

// ============================================================================
// SECTION: Calibration Reports
// ============================================================================

/// Optional external calibration metrics consumed by the gatekeeper.
///
/// Absence of a field means the corresponding check is skipped, not failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationReport {
    /// F1 score from an external calibration run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,
    /// Accuracy from an external calibration run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Matthews correlation coefficient from an external calibration run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcc: Option<f64>,
}
