// toolforge-core/src/core/identifiers.rs
// ============================================================================
// Module: Toolforge Identifiers
// Description: Canonical opaque identifiers for sessions, tools, and artifacts.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Toolforge. Session and tool identifiers are opaque and serialize as plain
//! strings. Artifact identifiers are namespaced by artifact kind (`obs:`,
//! `pat:`, `cand:`, `script:`, `gate:`, `exec:`) so the lineage graph stays
//! human-auditable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Session Identifier
// ============================================================================

/// Session identifier scoped to one captured agent session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tool Name
// ============================================================================

/// Name of the tool invoked by an execution pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

/// Default tool name used when a transcript entry omits one.
pub const UNKNOWN_TOOL_NAME: &str = "unknown";

impl ToolName {
    /// Creates a new tool name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the fallback tool name for entries without one.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TOOL_NAME)
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ToolName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Artifact Kinds
// ============================================================================

/// Artifact kinds recorded in the lineage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Captured tool execution observation.
    Observation,
    /// Aggregated operation pattern with determinism statistics.
    Pattern,
    /// Promotion candidate proposed for automation.
    Candidate,
    /// Generated automation script.
    Script,
    /// Gatekeeper decision.
    Gate,
    /// Live execution checked by the drift monitor.
    Execution,
}

impl ArtifactKind {
    /// Returns the stable namespace prefix for this artifact kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Observation => "obs",
            Self::Pattern => "pat",
            Self::Candidate => "cand",
            Self::Script => "script",
            Self::Gate => "gate",
            Self::Execution => "exec",
        }
    }

    /// Resolves an artifact kind from its namespace prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "obs" => Some(Self::Observation),
            "pat" => Some(Self::Pattern),
            "cand" => Some(Self::Candidate),
            "script" => Some(Self::Script),
            "gate" => Some(Self::Gate),
            "exec" => Some(Self::Execution),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Artifact Identifier
// ============================================================================

/// Namespaced artifact identifier used by the lineage graph.
///
/// # Invariants
/// - The string form is `<prefix>:<suffix>` where `<prefix>` names the kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Creates a namespaced artifact identifier for the given kind.
    #[must_use]
    pub fn new(kind: ArtifactKind, suffix: impl AsRef<str>) -> Self {
        Self(format!("{}:{}", kind.prefix(), suffix.as_ref()))
    }

    /// Wraps an already-namespaced identifier string.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the artifact kind encoded in the namespace prefix, if valid.
    #[must_use]
    pub fn kind(&self) -> Option<ArtifactKind> {
        let (prefix, _) = self.0.split_once(':')?;
        ArtifactKind::from_prefix(prefix)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
