// toolforge-core/src/core/execution.rs
// ============================================================================
// Module: Toolforge Execution Model
// Description: Transcript entries, tool execution pairs, and stored batches.
// Purpose: Model captured agent activity as immutable, replayable records.
// Dependencies: crate::core::{hashing, identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Execution records are the raw evidence the pipeline mines. A session
//! transcript is an ordered sequence of entries; capture pairs each `tool_use`
//! with its matching `tool_result` and stores the pairs in an append-only
//! batch. Entries that fail to parse or carry no tool information are skipped
//! at the capture boundary, never downstream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::ToolName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Transcript Entries
// ============================================================================

/// One entry in a session transcript.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Optional fields model partial records; defaulting happens at capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// A tool invocation issued by the agent.
    ToolUse {
        /// Entry identifier referenced by the matching result.
        entry_id: String,
        /// Tool name; absent names default to `unknown` at capture.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        /// Structured tool input.
        #[serde(default)]
        input: Value,
    },
    /// The result returned for a prior tool invocation.
    ToolResult {
        /// Back-reference to the originating `tool_use` entry.
        tool_use_id: String,
        /// Tool output text; absent for failed or voided calls.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    /// Conversational content with no tool activity.
    Message {
        /// Message text, retained only for completeness.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// Unrecognized entry type, skipped by capture.
    #[serde(other)]
    Unknown,
}

/// Ordered transcript for one agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTranscript {
    /// Session identifier.
    pub session_id: SessionId,
    /// Host-supplied context labels for the session.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Ordered transcript entries.
    pub entries: Vec<TranscriptEntry>,
}

// ============================================================================
// SECTION: Execution Pairs
// ============================================================================

/// Completion status of a tool execution pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    /// The invocation has a matched result.
    Complete,
    /// The invocation never received a result.
    Partial,
}

/// Session context carried by every pair in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Session identifier.
    pub session_id: SessionId,
    /// Host-supplied context labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// One completed or partial tool call reconstructed from a transcript.
///
/// # Invariants
/// - `status` is `Complete` iff `output` and `output_hash` are present.
/// - Pairs are immutable once stored in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExecutionPair {
    /// Pair identifier, unique within the session.
    pub pair_id: String,
    /// Tool name, defaulted to `unknown` when the transcript omits it.
    pub tool_name: ToolName,
    /// Structured tool input.
    pub input: Value,
    /// Tool output text, absent for partial pairs.
    pub output: Option<String>,
    /// Hash of the output text, absent for partial pairs.
    pub output_hash: Option<HashDigest>,
    /// Completion status.
    pub status: PairStatus,
    /// Session context.
    pub context: SessionContext,
}

// ============================================================================
// SECTION: Stored Batches
// ============================================================================

/// Append-only batch of execution pairs captured from one session.
///
/// # Invariants
/// - `complete_count + partial_count == pairs.len()`.
/// - Batches are never mutated after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredExecutionBatch {
    /// Session identifier.
    pub session_id: SessionId,
    /// Session context shared by all pairs.
    pub context: SessionContext,
    /// Captured execution pairs in transcript order.
    pub pairs: Vec<ToolExecutionPair>,
    /// Number of complete pairs.
    pub complete_count: usize,
    /// Number of partial pairs.
    pub partial_count: usize,
    /// Capture timestamp supplied by the host.
    pub captured_at: Timestamp,
}
