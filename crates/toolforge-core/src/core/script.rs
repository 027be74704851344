// toolforge-core/src/core/script.rs
// ============================================================================
// Module: Toolforge Generated Scripts
// Description: Generated automation scripts and dry-run outcomes.
// Purpose: Model the concrete artifact produced for an approved candidate.
// Dependencies: crate::core::{hashing, operation, time}, serde
// ============================================================================

//! ## Overview
//! An approved candidate is materialized as a shell script that replays the
//! operation. The dry run executes the script in an external sandbox and
//! compares the output hash against the hash the candidate was promoted on;
//! a script must reproduce exactly the behavior that earned it promotion,
//! not merely execute without error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::operation::OperationKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Generated Scripts
// ============================================================================

/// Concrete automation script materialized for an approved candidate.
///
/// # Invariants
/// - Created only after an `approved: true` gatekeeper decision.
/// - `is_valid` is false when the operation input could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScript {
    /// Operation the script replays.
    pub operation: OperationKey,
    /// POSIX shell script body.
    pub script_content: String,
    /// Whether rendering produced a well-formed script.
    pub is_valid: bool,
    /// Output hash the operation was promoted on, from history.
    pub expected_output_hash: Option<HashDigest>,
    /// Generation timestamp supplied by the caller.
    pub generated_at: Timestamp,
}

// ============================================================================
// SECTION: Dry-Run Results
// ============================================================================

/// Outcome of validating a generated script against history.
///
/// # Invariants
/// - `passed` requires `actual_output_hash == expected_output_hash` and a
///   zero exit code.
/// - A failing dry run carries a `failure_reason` and never retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunResult {
    /// Whether the script reproduced the promoted behavior.
    pub passed: bool,
    /// Hash of the sandbox's actual output, when the run produced one.
    pub actual_output_hash: Option<HashDigest>,
    /// Expected output hash derived from history.
    pub expected_output_hash: Option<HashDigest>,
    /// Sandbox exit code, when the script was launched.
    pub exit_code: Option<i32>,
    /// Sandbox execution duration in milliseconds, when available.
    pub duration_ms: Option<u64>,
    /// Reason the dry run failed, absent on success.
    pub failure_reason: Option<String>,
}
