// toolforge-core/src/runtime/validator.rs
// ============================================================================
// Module: Toolforge Script Validator
// Description: Script materialization and sandboxed dry-run verification.
// Purpose: Prove a generated script reproduces the behavior it was promoted on.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! For an approved candidate the validator renders a POSIX shell replay of
//! the operation and requests a dry run from the external sandbox. The dry
//! run passes only when the sandbox's output hash equals the hash derived
//! from the candidate's own history — reproducing the promoted behavior, not
//! merely exiting cleanly. A failing dry run is reported and never retried
//! here; retry policy belongs to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::DryRunResult;
use crate::core::GeneratedScript;
use crate::core::PairStatus;
use crate::core::PromotionCandidate;
use crate::core::StoredExecutionBatch;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_text;
use crate::core::operation::OperationKey;
use crate::core::time::Timestamp;
use crate::interfaces::SandboxExecutor;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for script validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Sandbox execution timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while materializing a script.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The candidate has no stored observations to materialize from.
    #[error("no stored observations for operation: {0}")]
    NoObservations(String),
    /// Hashing error.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Script Validator
// ============================================================================

/// Materializes and dry-run-verifies scripts for approved candidates.
pub struct ScriptValidator<X> {
    /// External sandbox executor.
    sandbox: X,
    /// Hash algorithm for output digests.
    algorithm: HashAlgorithm,
    /// Validator configuration.
    config: ValidatorConfig,
}

impl<X> ScriptValidator<X>
where
    X: SandboxExecutor,
{
    /// Creates a new script validator.
    #[must_use]
    pub const fn new(sandbox: X, algorithm: HashAlgorithm, config: ValidatorConfig) -> Self {
        Self {
            sandbox,
            algorithm,
            config,
        }
    }

    /// Returns the validator configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Materializes a generated script for an approved candidate.
    ///
    /// The expected output hash is the most frequent output hash across the
    /// operation's complete observations, ties broken by hash value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoObservations`] when the snapshot holds no
    /// complete pair for the operation.
    pub fn materialize(
        &self,
        candidate: &PromotionCandidate,
        batches: &[StoredExecutionBatch],
        generated_at: Timestamp,
    ) -> Result<GeneratedScript, ValidationError> {
        let operation = &candidate.operation.score.operation;
        let mut representative_input: Option<Value> = None;
        let mut hash_counts: BTreeMap<String, (usize, HashDigest)> = BTreeMap::new();

        for batch in batches {
            for pair in &batch.pairs {
                if pair.status != PairStatus::Complete {
                    continue;
                }
                let key =
                    OperationKey::for_invocation(self.algorithm, &pair.tool_name, &pair.input)?;
                if key != *operation {
                    continue;
                }
                if representative_input.is_none() {
                    representative_input = Some(pair.input.clone());
                }
                if let Some(hash) = pair.output_hash.as_ref() {
                    let entry = hash_counts
                        .entry(hash.value.clone())
                        .or_insert_with(|| (0, hash.clone()));
                    entry.0 += 1;
                }
            }
        }

        let Some(input) = representative_input else {
            return Err(ValidationError::NoObservations(operation.key_string()));
        };

        let expected_output_hash = hash_counts
            .into_iter()
            .max_by_key(|(value, (count, _))| (*count, std::cmp::Reverse(value.clone())))
            .map(|(_, (_, hash))| hash);

        let script_content = render_script(operation.tool_name.as_str(), &input);
        let is_valid = script_content.is_some();

        Ok(GeneratedScript {
            operation: operation.clone(),
            script_content: script_content.unwrap_or_default(),
            is_valid,
            expected_output_hash,
            generated_at,
        })
    }

    /// Dry-runs a generated script against its expected output hash.
    ///
    /// Sandbox failures (timeout, crash, nonzero exit) surface as
    /// `passed: false` with a `failure_reason`; they are never thrown.
    #[must_use]
    pub fn dry_run(&self, script: &GeneratedScript) -> DryRunResult {
        if !script.is_valid {
            return DryRunResult {
                passed: false,
                actual_output_hash: None,
                expected_output_hash: script.expected_output_hash.clone(),
                exit_code: None,
                duration_ms: None,
                failure_reason: Some("script failed schema validation".to_string()),
            };
        }
        let Some(expected) = script.expected_output_hash.clone() else {
            return DryRunResult {
                passed: false,
                actual_output_hash: None,
                expected_output_hash: None,
                exit_code: None,
                duration_ms: None,
                failure_reason: Some("no expected output hash in history".to_string()),
            };
        };

        match self.sandbox.run(&script.script_content, self.config.timeout_ms) {
            Ok(outcome) => {
                let actual = hash_text(self.algorithm, &outcome.stdout);
                let matched = actual == expected;
                let passed = matched && outcome.exit_code == 0;
                let failure_reason = if passed {
                    None
                } else if outcome.exit_code != 0 {
                    Some(format!("script exited with code {}", outcome.exit_code))
                } else {
                    Some("output hash does not match promoted behavior".to_string())
                };
                DryRunResult {
                    passed,
                    actual_output_hash: Some(actual),
                    expected_output_hash: Some(expected),
                    exit_code: Some(outcome.exit_code),
                    duration_ms: Some(outcome.duration_ms),
                    failure_reason,
                }
            }
            Err(err) => DryRunResult {
                passed: false,
                actual_output_hash: None,
                expected_output_hash: Some(expected),
                exit_code: None,
                duration_ms: None,
                failure_reason: Some(err.to_string()),
            },
        }
    }
}

// ============================================================================
// SECTION: Script Rendering
// ============================================================================

/// Renders a POSIX shell replay for a tool invocation.
///
/// Returns `None` when the input cannot be rendered into a well-formed
/// script; the caller records the script as invalid, which blocks promotion.
#[must_use]
pub fn render_script(tool_name: &str, input: &Value) -> Option<String> {
    let body = match tool_name {
        "Bash" => str_field(input, "command")?.to_string(),
        "Read" => format!("cat {}", shell_quote(str_field(input, "file_path")?)),
        "Write" => render_write(input)?,
        "Glob" => render_glob(input)?,
        "Grep" => render_grep(input)?,
        "Edit" => render_edit(input)?,
        "WebFetch" => format!("curl -fsSL {}", shell_quote(str_field(input, "url")?)),
        _ => return None,
    };
    Some(format!("#!/bin/sh\nset -eu\n{body}\n"))
}

/// Renders a `Write` invocation as a quoted heredoc.
fn render_write(input: &Value) -> Option<String> {
    let path = str_field(input, "file_path")?;
    let content = str_field(input, "content")?;
    if content.contains("\nTOOLFORGE_EOF") || content.starts_with("TOOLFORGE_EOF") {
        return None;
    }
    Some(format!("cat > {} <<'TOOLFORGE_EOF'\n{content}\nTOOLFORGE_EOF", shell_quote(path)))
}

/// Renders a `Glob` invocation as a `find` expression.
fn render_glob(input: &Value) -> Option<String> {
    let pattern = str_field(input, "pattern")?;
    let path = str_field(input, "path").unwrap_or(".");
    Some(format!("find {} -path {} -print", shell_quote(path), shell_quote(pattern)))
}

/// Renders a `Grep` invocation as a recursive `grep`.
fn render_grep(input: &Value) -> Option<String> {
    let pattern = str_field(input, "pattern")?;
    let path = str_field(input, "path").unwrap_or(".");
    Some(format!("grep -rn {} {}", shell_quote(pattern), shell_quote(path)))
}

/// Renders an `Edit` invocation as an in-place `sed` substitution.
///
/// Only single-line replacements free of the substitution delimiter are
/// renderable; anything else is rejected as unrenderable.
fn render_edit(input: &Value) -> Option<String> {
    let path = str_field(input, "file_path")?;
    let old = str_field(input, "old_string")?;
    let new = str_field(input, "new_string")?;
    if old.is_empty()
        || old.contains('\n')
        || new.contains('\n')
        || old.contains('|')
        || new.contains('|')
    {
        return None;
    }
    let expression = format!("s|{}|{}|", escape_sed_pattern(old), escape_sed_replacement(new));
    Some(format!("sed -i {} {}", shell_quote(&expression), shell_quote(path)))
}

/// Returns a string field from a JSON object input.
fn str_field<'a>(input: &'a Value, field: &str) -> Option<&'a str> {
    input.get(field).and_then(Value::as_str)
}

/// Quotes a string for safe interpolation into a shell command.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Escapes basic-regex metacharacters in a sed match pattern.
fn escape_sed_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        if matches!(ch, '\\' | '.' | '*' | '[' | ']' | '^' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escapes replacement metacharacters in a sed substitution.
fn escape_sed_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    for ch in replacement.chars() {
        if matches!(ch, '\\' | '&') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
