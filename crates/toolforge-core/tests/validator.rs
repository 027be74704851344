// toolforge-core/tests/validator.rs
// ============================================================================
// Module: Script Validator Tests
// Description: Tests for script rendering and dry-run verification.
// ============================================================================
//! ## Overview
//! Validates per-tool script rendering, shell quoting, and the dry-run
//! contract against a stub sandbox.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use serde_json::json;
use toolforge_core::DeterminismAnalyzer;
use toolforge_core::DeterminismConfig;
use toolforge_core::DetectorConfig;
use toolforge_core::PromotionCandidate;
use toolforge_core::PromotionDetector;
use toolforge_core::SandboxError;
use toolforge_core::SandboxExecutor;
use toolforge_core::SandboxOutcome;
use toolforge_core::ScriptValidator;
use toolforge_core::SessionId;
use toolforge_core::SessionTranscript;
use toolforge_core::StoredExecutionBatch;
use toolforge_core::Timestamp;
use toolforge_core::TranscriptEntry;
use toolforge_core::ValidatorConfig;
use toolforge_core::hashing::DEFAULT_HASH_ALGORITHM;
use toolforge_core::runtime::build_batch;
use toolforge_core::runtime::render_script;
use toolforge_core::runtime::shell_quote;

/// Stub sandbox returning a fixed outcome or error.
struct StaticSandbox {
    /// Result returned for every run.
    result: Result<SandboxOutcome, SandboxError>,
}

impl StaticSandbox {
    fn ok(stdout: &str, exit_code: i32) -> Self {
        Self {
            result: Ok(SandboxOutcome {
                stdout: stdout.to_string(),
                exit_code,
                duration_ms: 5,
            }),
        }
    }

    const fn err(error: SandboxError) -> Self {
        Self {
            result: Err(error),
        }
    }
}

impl SandboxExecutor for StaticSandbox {
    fn run(&self, _script: &str, _timeout_ms: u64) -> Result<SandboxOutcome, SandboxError> {
        match &self.result {
            Ok(outcome) => Ok(outcome.clone()),
            Err(SandboxError::Timeout(ms)) => Err(SandboxError::Timeout(*ms)),
            Err(SandboxError::Launch(message)) => Err(SandboxError::Launch(message.clone())),
            Err(SandboxError::Sandbox(message)) => Err(SandboxError::Sandbox(message.clone())),
        }
    }
}

/// Builds a batch plus the single detected candidate for a Bash operation.
fn bash_candidate(output: &str) -> (Vec<StoredExecutionBatch>, PromotionCandidate) {
    let mut entries = Vec::new();
    for index in 0 .. 6 {
        entries.push(TranscriptEntry::ToolUse {
            entry_id: format!("t{index}"),
            tool_name: Some("Bash".to_string()),
            input: json!({"command": "wc -l Cargo.toml"}),
        });
        entries.push(TranscriptEntry::ToolResult {
            tool_use_id: format!("t{index}"),
            output: Some(output.to_string()),
        });
    }
    let batches = vec![build_batch(
        DEFAULT_HASH_ALGORITHM,
        &SessionTranscript {
            session_id: SessionId::new("session-1"),
            labels: BTreeMap::new(),
            entries,
        },
        Timestamp::Logical(1),
    )];
    let analyzer = DeterminismAnalyzer::new(DEFAULT_HASH_ALGORITHM, DeterminismConfig::default());
    let classified = analyzer.analyze(&batches).unwrap();
    let candidates = PromotionDetector::new(DEFAULT_HASH_ALGORITHM, DetectorConfig::default())
        .detect(&classified, &batches)
        .unwrap();
    let candidate = candidates[0].clone();
    (batches, candidate)
}

// ============================================================================
// SECTION: Script Rendering
// ============================================================================

/// Tests Bash inputs render as the command itself.
#[test]
fn test_render_bash_command() {
    let script = render_script("Bash", &json!({"command": "wc -l Cargo.toml"})).unwrap();
    assert!(script.starts_with("#!/bin/sh\nset -eu\n"));
    assert!(script.contains("wc -l Cargo.toml"));
}

/// Tests Read inputs render as a quoted cat.
#[test]
fn test_render_read_quotes_path() {
    let script = render_script("Read", &json!({"file_path": "/tmp/it's here"})).unwrap();
    assert!(script.contains(r"cat '/tmp/it'\''s here'"));
}

/// Tests Grep inputs render pattern and default path.
#[test]
fn test_render_grep_defaults_path() {
    let script = render_script("Grep", &json!({"pattern": "fn main"})).unwrap();
    assert!(script.contains("grep -rn 'fn main' '.'"));
}

/// Tests WebFetch inputs render as curl.
#[test]
fn test_render_webfetch() {
    let script = render_script("WebFetch", &json!({"url": "https://example.com/x"})).unwrap();
    assert!(script.contains("curl -fsSL 'https://example.com/x'"));
}

/// Tests Write inputs render as a quoted heredoc.
#[test]
fn test_render_write_heredoc() {
    let script = render_script(
        "Write",
        &json!({"file_path": "/tmp/out.txt", "content": "line one\nline two"}),
    )
    .unwrap();
    assert!(script.contains("cat > '/tmp/out.txt' <<'TOOLFORGE_EOF'"));
    assert!(script.contains("line one\nline two\nTOOLFORGE_EOF"));
}

/// Tests single-line Edit inputs render as sed with escaped metacharacters.
#[test]
fn test_render_edit_escapes_pattern() {
    let script = render_script(
        "Edit",
        &json!({
            "file_path": "/tmp/a.rs",
            "old_string": "1.0.0",
            "new_string": "2.0.0"
        }),
    )
    .unwrap();
    assert!(script.contains(r"sed -i 's|1\.0\.0|2.0.0|' '/tmp/a.rs'"));
}

/// Tests multi-line Edit inputs are rejected as unrenderable.
#[test]
fn test_render_edit_rejects_multiline() {
    let rendered = render_script(
        "Edit",
        &json!({
            "file_path": "/tmp/a.rs",
            "old_string": "fn a() {\n}",
            "new_string": "fn b() {\n}"
        }),
    );
    assert!(rendered.is_none());
}

/// Tests unknown tools are rejected as unrenderable.
#[test]
fn test_render_unknown_tool_is_none() {
    assert!(render_script("TodoWrite", &json!({"items": []})).is_none());
    assert!(render_script("Bash", &json!({})).is_none());
}

/// Tests shell quoting survives embedded single quotes.
#[test]
fn test_shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("a'b"), r"'a'\''b'");
    assert_eq!(shell_quote("plain"), "'plain'");
}

// ============================================================================
// SECTION: Materialization
// ============================================================================

/// Tests materialization renders a valid script with the history hash.
#[test]
fn test_materialize_valid_script() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::ok("", 0),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let script = validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    assert!(script.is_valid);
    assert!(script.script_content.contains("wc -l Cargo.toml"));
    assert!(script.expected_output_hash.is_some());
    assert_eq!(script.generated_at, Timestamp::Logical(2));
}

// ============================================================================
// SECTION: Dry Runs
// ============================================================================

/// Tests a dry run passes when the sandbox reproduces history exactly.
#[test]
fn test_dry_run_passes_on_matching_output() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::ok("42 Cargo.toml\n", 0),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let script = validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    let result = validator.dry_run(&script);
    assert!(result.passed);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.failure_reason.is_none());
    assert_eq!(result.actual_output_hash, result.expected_output_hash);
}

/// Tests a mismatched output fails the dry run with a reason.
#[test]
fn test_dry_run_fails_on_mismatched_output() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::ok("43 Cargo.toml\n", 0),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let script = validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    let result = validator.dry_run(&script);
    assert!(!result.passed);
    assert!(result.failure_reason.unwrap().contains("does not match"));
}

/// Tests a nonzero exit blocks promotion even with matching output.
#[test]
fn test_dry_run_fails_on_nonzero_exit() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::ok("42 Cargo.toml\n", 3),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let script = validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    let result = validator.dry_run(&script);
    assert!(!result.passed);
    assert_eq!(result.exit_code, Some(3));
    assert!(result.failure_reason.unwrap().contains("exited with code 3"));
}

/// Tests a sandbox timeout surfaces as a failed result, never an error.
#[test]
fn test_dry_run_fails_on_sandbox_timeout() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::err(SandboxError::Timeout(30_000)),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let script = validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    let result = validator.dry_run(&script);
    assert!(!result.passed);
    assert!(result.exit_code.is_none());
    assert!(result.failure_reason.unwrap().contains("timed out"));
}

/// Tests an invalid script is reported without calling the sandbox.
#[test]
fn test_dry_run_rejects_invalid_script() {
    let (batches, candidate) = bash_candidate("42 Cargo.toml\n");
    let validator = ScriptValidator::new(
        StaticSandbox::ok("", 0),
        DEFAULT_HASH_ALGORITHM,
        ValidatorConfig::default(),
    );

    let mut script =
        validator.materialize(&candidate, &batches, Timestamp::Logical(2)).unwrap();
    script.is_valid = false;
    let result = validator.dry_run(&script);
    assert!(!result.passed);
    assert!(result.failure_reason.unwrap().contains("schema validation"));
}
