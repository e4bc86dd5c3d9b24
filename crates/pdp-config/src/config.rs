// crates/pdp-config/src/config.rs
// ============================================================================
// Module: PDP Configuration
// Description: Configuration document model, loading, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! The PDP configuration is a TOML document listing extension identifiers
//! per extensibility point, the flags selecting built-in sets, optional depth
//! limits, and pass-through settings for the engine's external collaborators
//! (attribute providers, policy providers, decision cache, filters).
//! Loading enforces path, size, and encoding limits; unknown keys and
//! malformed identifiers fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::limits::UnboundedLimit;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "pdp.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PDP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of an extension identifier in bytes.
pub const MAX_EXTENSION_ID_LENGTH: usize = 1024;
/// Maximum number of extension identifiers per extensibility point.
pub const MAX_EXTENSIONS_PER_POINT: usize = 256;
/// Maximum number of attribute providers.
pub const MAX_ATTRIBUTE_PROVIDERS: usize = 64;

// ============================================================================
// SECTION: Configuration Document
// ============================================================================

/// PDP configuration document.
///
/// # Invariants
/// - Identifier lists keep document order; order is significant only for
///   diagnostics.
/// - Pass-through fields are forwarded to the engine unmodified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdpConfig {
    /// Enables `XPath` support (datatype and functions).
    #[serde(default)]
    pub enable_xpath: bool,
    /// Includes the standard datatypes.
    #[serde(default = "default_true")]
    pub use_standard_datatypes: bool,
    /// Includes the standard functions.
    #[serde(default = "default_true")]
    pub use_standard_functions: bool,
    /// Includes the standard combining algorithms.
    #[serde(default = "default_true")]
    pub use_standard_combining_algorithms: bool,
    /// Datatype extension identifiers.
    #[serde(default)]
    pub datatypes: Vec<String>,
    /// Non-generic function extension identifiers.
    #[serde(default)]
    pub functions: Vec<String>,
    /// Combining algorithm extension identifiers.
    #[serde(default)]
    pub combining_algorithms: Vec<String>,
    /// Maximum depth of variable reference chains.
    #[serde(default)]
    pub max_variable_ref_depth: Option<UnboundedLimit>,
    /// Maximum depth of policy reference chains.
    #[serde(default)]
    pub max_policy_ref_depth: Option<UnboundedLimit>,
    /// Attribute providers, in evaluation order.
    #[serde(default)]
    pub attribute_providers: Vec<ExtensionConfig>,
    /// Root policy provider.
    pub root_policy_provider: ExtensionConfig,
    /// Policy reference resolver.
    #[serde(default)]
    pub ref_policy_provider: Option<ExtensionConfig>,
    /// Decision cache.
    #[serde(default)]
    pub decision_cache: Option<ExtensionConfig>,
    /// Request preprocessing filter identifier.
    #[serde(default)]
    pub request_filter: Option<String>,
    /// Decision result filter identifier.
    #[serde(default)]
    pub result_filter: Option<String>,
    /// Requires attribute designators to match the issuer strictly.
    #[serde(default)]
    pub strict_attribute_issuer_match: bool,
    /// Source of standard environment attributes.
    #[serde(default)]
    pub standard_env_attribute_source: StandardEnvAttributeSource,
    /// Detail level of status messages for malformed requests.
    #[serde(default)]
    pub bad_request_status_detail_level: u32,
}

impl PdpConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_file(&resolved)
    }

    /// Loads configuration from an already resolved path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates identifier hygiene and collection limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier_list("datatypes", &self.datatypes)?;
        validate_identifier_list("functions", &self.functions)?;
        validate_identifier_list("combining_algorithms", &self.combining_algorithms)?;
        if self.attribute_providers.len() > MAX_ATTRIBUTE_PROVIDERS {
            return Err(ConfigError::Invalid(format!(
                "attribute_providers exceeds max entries ({MAX_ATTRIBUTE_PROVIDERS})"
            )));
        }
        for provider in &self.attribute_providers {
            provider.validate("attribute_providers")?;
        }
        self.root_policy_provider.validate("root_policy_provider")?;
        if let Some(provider) = &self.ref_policy_provider {
            provider.validate("ref_policy_provider")?;
        }
        if let Some(cache) = &self.decision_cache {
            cache.validate("decision_cache")?;
        }
        if let Some(filter) = &self.request_filter {
            validate_identifier("request_filter", filter)?;
        }
        if let Some(filter) = &self.result_filter {
            validate_identifier("result_filter", filter)?;
        }
        Ok(())
    }
}

/// Configuration of one externally provided component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Identifier of the component implementation.
    pub extension: String,
    /// Implementation-specific settings, passed through verbatim.
    #[serde(default)]
    pub settings: toml::Table,
}

impl ExtensionConfig {
    /// Creates a configuration without settings.
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            settings: toml::Table::new(),
        }
    }

    /// Returns a string setting, if present.
    #[must_use]
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(toml::Value::as_str)
    }

    /// Validates the implementation identifier.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        validate_identifier(field, &self.extension)
    }
}

/// Source of standard environment attributes (current time and date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardEnvAttributeSource {
    /// Request values win; the PDP fills in missing ones.
    #[default]
    RequestElsePdp,
    /// Only values from the request are used.
    RequestOnly,
    /// Only PDP-computed values are used.
    PdpOnly,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Depth limit outside the bounded integer range.
    #[error("invalid {field}: {value} exceeds {max}", max = i32::MAX)]
    LimitOutOfRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Resolves the config path from CLI or environment defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the environment override is too long.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates an extension identifier.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} identifier must be non-empty")));
    }
    if value.len() > MAX_EXTENSION_ID_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} identifier exceeds max length ({MAX_EXTENSION_ID_LENGTH})"
        )));
    }
    Ok(())
}

/// Validates a per-point identifier list.
fn validate_identifier_list(field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.len() > MAX_EXTENSIONS_PER_POINT {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds max entries ({MAX_EXTENSIONS_PER_POINT})"
        )));
    }
    for value in values {
        validate_identifier(field, value)?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
