// toolforge-config/src/config.rs
// ============================================================================
// Module: Toolforge Configuration
// Description: Configuration loading and validation for Toolforge.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: toolforge-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Section defaults match the
//! core's documented defaults exactly, so an empty file configures the
//! pipeline the same way `PipelineConfig::default()` does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use toolforge_core::DeterminismConfig;
use toolforge_core::DetectorConfig;
use toolforge_core::DriftConfig;
use toolforge_core::GatekeeperConfig;
use toolforge_core::PipelineConfig;
use toolforge_core::ToolName;
use toolforge_core::ValidatorConfig;
use toolforge_core::hashing::DEFAULT_HASH_ALGORITHM;
use toolforge_core::runtime::detector::PROMOTABLE_TOOLS;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "toolforge.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TOOLFORGE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum sandbox dry-run timeout in milliseconds.
pub(crate) const MIN_SANDBOX_TIMEOUT_MS: u64 = 100;
/// Maximum sandbox dry-run timeout in milliseconds.
pub(crate) const MAX_SANDBOX_TIMEOUT_MS: u64 = 600_000;
/// Maximum drift sensitivity accepted by validation.
pub(crate) const MAX_DRIFT_SENSITIVITY: usize = 100;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Toolforge pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolforgeConfig {
    /// Determinism analyzer configuration.
    #[serde(default)]
    pub determinism: DeterminismSection,
    /// Promotion detector configuration.
    #[serde(default)]
    pub detector: DetectorSection,
    /// Gatekeeper configuration.
    #[serde(default)]
    pub gatekeeper: GatekeeperSection,
    /// Script validator configuration.
    #[serde(default)]
    pub validator: ValidatorSection,
    /// Drift monitor configuration.
    #[serde(default)]
    pub drift: DriftSection,
}

impl ToolforgeConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, `TOOLFORGE_CONFIG` environment
    /// variable, then `toolforge.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.determinism.validate()?;
        self.detector.validate()?;
        self.gatekeeper.validate()?;
        self.validator.validate()?;
        self.drift.validate()?;
        Ok(())
    }

    /// Converts the validated configuration into the core pipeline config.
    #[must_use]
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            determinism: self.determinism.to_core(),
            detector: self.detector.to_core(),
            gatekeeper: self.gatekeeper.to_core(),
            validator: self.validator.to_core(),
            drift: self.drift.to_core(),
        }
    }
}

// ============================================================================
// SECTION: Determinism Section
// ============================================================================

/// Determinism analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterminismSection {
    /// Minimum determinism for the deterministic tier.
    #[serde(default = "default_deterministic_threshold")]
    pub deterministic_threshold: f64,
    /// Minimum determinism for the semi-deterministic tier.
    #[serde(default = "default_semi_deterministic_threshold")]
    pub semi_deterministic_threshold: f64,
    /// Observations required before a classification is trustworthy.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
}

/// Default deterministic-tier threshold.
fn default_deterministic_threshold() -> f64 {
    0.95
}

/// Default semi-deterministic-tier threshold.
fn default_semi_deterministic_threshold() -> f64 {
    0.7
}

/// Default minimum sample size.
fn default_min_sample_size() -> usize {
    3
}

impl Default for DeterminismSection {
    fn default() -> Self {
        Self {
            deterministic_threshold: default_deterministic_threshold(),
            semi_deterministic_threshold: default_semi_deterministic_threshold(),
            min_sample_size: default_min_sample_size(),
        }
    }
}

impl DeterminismSection {
    /// Validates the determinism section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a threshold is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("determinism.deterministic_threshold", self.deterministic_threshold)?;
        validate_unit_interval(
            "determinism.semi_deterministic_threshold",
            self.semi_deterministic_threshold,
        )?;
        if self.semi_deterministic_threshold > self.deterministic_threshold {
            return Err(ConfigError::Invalid(
                "determinism.semi_deterministic_threshold must not exceed \
                 determinism.deterministic_threshold"
                    .to_string(),
            ));
        }
        if self.min_sample_size == 0 {
            return Err(ConfigError::Invalid(
                "determinism.min_sample_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts the section into the core analyzer config.
    #[must_use]
    pub const fn to_core(&self) -> DeterminismConfig {
        DeterminismConfig {
            deterministic_threshold: self.deterministic_threshold,
            semi_deterministic_threshold: self.semi_deterministic_threshold,
            min_sample_size: self.min_sample_size,
        }
    }
}

// ============================================================================
// SECTION: Detector Section
// ============================================================================

/// Promotion detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSection {
    /// Minimum determinism required to survive filtering.
    #[serde(default = "default_min_determinism")]
    pub min_determinism: f64,
    /// Tool names eligible for promotion.
    #[serde(default = "default_promotable_tool_names")]
    pub promotable_tools: Vec<String>,
    /// Minimum composite score for the confidence flag.
    #[serde(default)]
    pub min_composite_score: f64,
    /// Characters per token used for savings estimation.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

/// Default minimum determinism for detection and gatekeeping.
fn default_min_determinism() -> f64 {
    0.95
}

/// Default promotable tool names.
fn default_promotable_tool_names() -> Vec<String> {
    PROMOTABLE_TOOLS.iter().map(|name| (*name).to_string()).collect()
}

/// Default characters-per-token divisor.
fn default_chars_per_token() -> usize {
    4
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            min_determinism: default_min_determinism(),
            promotable_tools: default_promotable_tool_names(),
            min_composite_score: 0.0,
            chars_per_token: default_chars_per_token(),
        }
    }
}

impl DetectorSection {
    /// Validates the detector section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a field is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("detector.min_determinism", self.min_determinism)?;
        validate_unit_interval("detector.min_composite_score", self.min_composite_score)?;
        if self.chars_per_token == 0 {
            return Err(ConfigError::Invalid(
                "detector.chars_per_token must be at least 1".to_string(),
            ));
        }
        if self.promotable_tools.is_empty() {
            return Err(ConfigError::Invalid(
                "detector.promotable_tools must not be empty".to_string(),
            ));
        }
        if self.promotable_tools.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid(
                "detector.promotable_tools entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts the section into the core detector config.
    #[must_use]
    pub fn to_core(&self) -> DetectorConfig {
        DetectorConfig {
            min_determinism: self.min_determinism,
            promotable_tools:
                self.promotable_tools.iter().map(|name| ToolName::new(name.as_str())).collect(),
            min_composite_score: self.min_composite_score,
            chars_per_token: self.chars_per_token,
        }
    }
}

// ============================================================================
// SECTION: Gatekeeper Section
// ============================================================================

/// Gatekeeper settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatekeeperSection {
    /// Minimum determinism required for approval.
    #[serde(default = "default_min_determinism")]
    pub min_determinism: f64,
    /// Minimum composite score required for approval.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Minimum complete observations required for approval.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Optional minimum F1 score; omit to skip the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_f1: Option<f64>,
    /// Optional minimum accuracy; omit to skip the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_accuracy: Option<f64>,
    /// Optional minimum Matthews correlation; omit to skip the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mcc: Option<f64>,
}

/// Default minimum composite score for approval.
fn default_min_confidence() -> f64 {
    0.85
}

/// Default minimum observation count for approval.
fn default_min_observations() -> usize {
    5
}

impl Default for GatekeeperSection {
    fn default() -> Self {
        Self {
            min_determinism: default_min_determinism(),
            min_confidence: default_min_confidence(),
            min_observations: default_min_observations(),
            min_f1: None,
            min_accuracy: None,
            min_mcc: None,
        }
    }
}

impl GatekeeperSection {
    /// Validates the gatekeeper section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a threshold is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("gatekeeper.min_determinism", self.min_determinism)?;
        validate_unit_interval("gatekeeper.min_confidence", self.min_confidence)?;
        if self.min_observations == 0 {
            return Err(ConfigError::Invalid(
                "gatekeeper.min_observations must be at least 1".to_string(),
            ));
        }
        if let Some(min_f1) = self.min_f1 {
            validate_unit_interval("gatekeeper.min_f1", min_f1)?;
        }
        if let Some(min_accuracy) = self.min_accuracy {
            validate_unit_interval("gatekeeper.min_accuracy", min_accuracy)?;
        }
        if let Some(min_mcc) = self.min_mcc
            && !(-1.0 ..= 1.0).contains(&min_mcc)
        {
            return Err(ConfigError::Invalid(
                "gatekeeper.min_mcc must be within [-1, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts the section into the core gatekeeper config.
    #[must_use]
    pub const fn to_core(&self) -> GatekeeperConfig {
        GatekeeperConfig {
            min_determinism: self.min_determinism,
            min_confidence: self.min_confidence,
            min_observations: self.min_observations,
            min_f1: self.min_f1,
            min_accuracy: self.min_accuracy,
            min_mcc: self.min_mcc,
        }
    }
}

// ============================================================================
// SECTION: Validator Section
// ============================================================================

/// Script validator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSection {
    /// Sandbox dry-run timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Default sandbox dry-run timeout.
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ValidatorSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ValidatorSection {
    /// Validates the validator section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the timeout is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SANDBOX_TIMEOUT_MS ..= MAX_SANDBOX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "validator.timeout_ms must be within [{MIN_SANDBOX_TIMEOUT_MS}, \
                 {MAX_SANDBOX_TIMEOUT_MS}]"
            )));
        }
        Ok(())
    }

    /// Converts the section into the core validator config.
    #[must_use]
    pub const fn to_core(&self) -> ValidatorConfig {
        ValidatorConfig {
            timeout_ms: self.timeout_ms,
        }
    }
}

// ============================================================================
// SECTION: Drift Section
// ============================================================================

/// Drift monitor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSection {
    /// Consecutive mismatches required to demote.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: usize,
    /// Whether mismatch counting and demotion are active.
    #[serde(default = "default_drift_enabled")]
    pub enabled: bool,
}

/// Default drift sensitivity.
fn default_sensitivity() -> usize {
    3
}

/// Drift monitoring is on unless explicitly disabled.
fn default_drift_enabled() -> bool {
    true
}

impl Default for DriftSection {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            enabled: default_drift_enabled(),
        }
    }
}

impl DriftSection {
    /// Validates the drift section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the sensitivity is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensitivity == 0 || self.sensitivity > MAX_DRIFT_SENSITIVITY {
            return Err(ConfigError::Invalid(format!(
                "drift.sensitivity must be within [1, {MAX_DRIFT_SENSITIVITY}]"
            )));
        }
        Ok(())
    }

    /// Converts the section into the core drift config.
    #[must_use]
    pub const fn to_core(&self) -> DriftConfig {
        DriftConfig {
            sensitivity: self.sensitivity,
            enabled: self.enabled,
        }
    }
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the configuration path from explicit input or the environment.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(
        || {
            env::var_os(CONFIG_ENV_VAR)
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

/// Validates path length limits before reading.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let total_length = path.as_os_str().len();
    if total_length > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if let Component::Normal(part) = component
            && part.len() > MAX_PATH_COMPONENT_LENGTH
        {
            return Err(ConfigError::Invalid(
                "config path component exceeds length limit".to_string(),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Range Helpers
// ============================================================================

/// Validates that a threshold lies within the unit interval.
fn validate_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0 ..= 1.0).contains(&value) || value.is_nan() {
        return Err(ConfigError::Invalid(format!("{field} must be within [0, 1]")));
    }
    Ok(())
}
