// toolforge-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical examples for Toolforge configuration. Outputs are deterministic
//! and kept in sync with the config model's defaults and validation rules.

/// Returns a canonical example `toolforge.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[determinism]
deterministic_threshold = 0.95
semi_deterministic_threshold = 0.7
min_sample_size = 3

[detector]
min_determinism = 0.95
promotable_tools = ["Read", "Write", "Bash", "Glob", "Grep", "Edit", "WebFetch"]
min_composite_score = 0.0
chars_per_token = 4

[gatekeeper]
min_determinism = 0.95
min_confidence = 0.85
min_observations = 5
# min_f1 = 0.9
# min_accuracy = 0.9
# min_mcc = 0.8

[validator]
timeout_ms = 30000

[drift]
sensitivity = 3
enabled = true
"#,
    )
}
