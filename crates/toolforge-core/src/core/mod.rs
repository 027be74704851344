// toolforge-core/src/core/mod.rs
// ============================================================================
// Module: Toolforge Core Types
// Description: Canonical Toolforge execution, scoring, and lineage structures.
// Purpose: Provide stable, serializable types for pipeline records and decisions.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Toolforge core types define captured executions, operation identities,
//! determinism scores, promotion candidates, gatekeeper decisions, generated
//! scripts, drift records, and lineage entries. These types are the canonical
//! source of truth for any derived surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod candidate;
pub mod drift;
pub mod execution;
pub mod hashing;
pub mod identifiers;
pub mod lineage;
pub mod operation;
pub mod script;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use candidate::CheckOutcome;
pub use candidate::DecisionEvidence;
pub use candidate::GatekeeperDecision;
pub use candidate::OptionalCheckOutcome;
pub use candidate::PromotionCandidate;
pub use drift::DemotionDecision;
pub use drift::DriftEvent;
pub use execution::PairStatus;
pub use execution::SessionContext;
pub use execution::SessionTranscript;
pub use execution::StoredExecutionBatch;
pub use execution::ToolExecutionPair;
pub use execution::TranscriptEntry;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::ArtifactId;
pub use identifiers::ArtifactKind;
pub use identifiers::SessionId;
pub use identifiers::ToolName;
pub use identifiers::UNKNOWN_TOOL_NAME;
pub use lineage::CLASSIFICATION_METADATA_KEY;
pub use lineage::LineageEntry;
pub use lineage::PipelineStage;
pub use operation::ClassifiedOperation;
pub use operation::DeterminismScore;
pub use operation::DeterminismTier;
pub use operation::OperationKey;
pub use script::DryRunResult;
pub use script::GeneratedScript;
pub use state::OperationState;
pub use state::PromotionRecord;
pub use time::Timestamp;
