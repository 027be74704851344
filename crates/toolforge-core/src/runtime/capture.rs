// toolforge-core/src/runtime/capture.rs
// ============================================================================
// Module: Toolforge Execution Capture
// Description: Transcript pairing and execution batch capture.
// Purpose: Turn raw transcript entries into stored, identity-stable pairs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Capture pairs each `tool_use` entry with the next `tool_result` whose
//! back-reference matches it, tolerating arbitrary interleaved conversational
//! entries. Unmatched invocations become partial pairs with null output.
//! Malformed or unknown entries are skipped at this boundary; they are never
//! fatal to the batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::PairStatus;
use crate::core::SessionContext;
use crate::core::SessionTranscript;
use crate::core::StoredExecutionBatch;
use crate::core::ToolExecutionPair;
use crate::core::ToolName;
use crate::core::TranscriptEntry;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::hash_text;
use crate::core::time::Timestamp;
use crate::interfaces::ExecutionStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while capturing a session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Execution store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Execution Capture
// ============================================================================

/// Captures session transcripts into stored execution batches.
pub struct ExecutionCapture<S> {
    /// Execution store receiving captured batches.
    store: S,
    /// Hash algorithm for output digests.
    algorithm: HashAlgorithm,
}

impl<S> ExecutionCapture<S>
where
    S: ExecutionStore,
{
    /// Creates a new execution capture stage.
    #[must_use]
    pub const fn new(store: S, algorithm: HashAlgorithm) -> Self {
        Self {
            store,
            algorithm,
        }
    }

    /// Returns the configured hash algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Captures one session transcript and appends the batch to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the store rejects the batch.
    pub fn capture_session(
        &self,
        transcript: &SessionTranscript,
        captured_at: Timestamp,
    ) -> Result<StoredExecutionBatch, CaptureError> {
        let batch = build_batch(self.algorithm, transcript, captured_at);
        self.store.append(&batch)?;
        Ok(batch)
    }
}

// ============================================================================
// SECTION: Pairing
// ============================================================================

/// Builds an execution batch from a transcript without storing it.
#[must_use]
pub fn build_batch(
    algorithm: HashAlgorithm,
    transcript: &SessionTranscript,
    captured_at: Timestamp,
) -> StoredExecutionBatch {
    let context = SessionContext {
        session_id: transcript.session_id.clone(),
        labels: transcript.labels.clone(),
    };
    let pairs = pair_entries(algorithm, &transcript.entries, &context);
    let complete_count =
        pairs.iter().filter(|pair| pair.status == PairStatus::Complete).count();
    let partial_count = pairs.len() - complete_count;

    StoredExecutionBatch {
        session_id: transcript.session_id.clone(),
        context,
        pairs,
        complete_count,
        partial_count,
        captured_at,
    }
}

/// An invocation awaiting its matching result.
struct OpenInvocation {
    /// Entry identifier referenced by the matching result.
    entry_id: String,
    /// Tool name, defaulted when absent.
    tool_name: ToolName,
    /// Structured tool input.
    input: Value,
    /// Matched output text, absent until a result arrives.
    output: Option<String>,
}

/// Pairs transcript entries into tool execution pairs in invocation order.
fn pair_entries(
    algorithm: HashAlgorithm,
    entries: &[TranscriptEntry],
    context: &SessionContext,
) -> Vec<ToolExecutionPair> {
    let mut open: Vec<OpenInvocation> = Vec::new();

    for entry in entries {
        match entry {
            TranscriptEntry::ToolUse {
                entry_id,
                tool_name,
                input,
            } => {
                open.push(OpenInvocation {
                    entry_id: entry_id.clone(),
                    tool_name: tool_name
                        .as_ref()
                        .map_or_else(ToolName::unknown, ToolName::new),
                    input: input.clone(),
                    output: None,
                });
            }
            TranscriptEntry::ToolResult {
                tool_use_id,
                output,
            } => {
                if let Some(invocation) = open
                    .iter_mut()
                    .find(|inv| inv.output.is_none() && inv.entry_id == *tool_use_id)
                {
                    invocation.output = Some(output.clone().unwrap_or_default());
                }
            }
            TranscriptEntry::Message {
                ..
            }
            | TranscriptEntry::Unknown => {}
        }
    }

    open.into_iter()
        .enumerate()
        .map(|(index, invocation)| {
            let output_hash =
                invocation.output.as_deref().map(|text| hash_text(algorithm, text));
            let status = if invocation.output.is_some() {
                PairStatus::Complete
            } else {
                PairStatus::Partial
            };
            ToolExecutionPair {
                pair_id: format!("{}:{}", context.session_id, index + 1),
                tool_name: invocation.tool_name,
                input: invocation.input,
                output: invocation.output,
                output_hash,
                status,
                context: context.clone(),
            }
        })
        .collect()
}
