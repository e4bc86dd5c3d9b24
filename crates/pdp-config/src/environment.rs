// crates/pdp-config/src/environment.rs
// ============================================================================
// Module: Environment Property Resolver
// Description: Configuration source model and derived environment properties.
// Purpose: Expose the configuration's base directory to extension instances.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! A configuration is read either from the filesystem or from a stream (any
//! non-`file:` URL). Filesystem-backed sources yield a `PARENT_DIR` property:
//! the URI of the directory holding the configuration file, with a trailing
//! slash. Stream sources yield no property; consumers must treat it as
//! optional.
//!
//! Extension settings can reference properties as `${NAME}` placeholders;
//! [`EnvironmentProperties::replace_placeholders`] substitutes the ones that
//! are present and leaves everything else untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::config::ConfigError;
use crate::config::MAX_TOTAL_PATH_LENGTH;

// ============================================================================
// SECTION: Configuration Source
// ============================================================================

/// Where a configuration document was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum ConfigSource {
    /// Filesystem-backed document.
    File(PathBuf),
    /// Non-filesystem document (network or packaged resource).
    Stream(String),
}

impl ConfigSource {
    /// Classifies a location string.
    ///
    /// Plain paths and `file:` URLs are filesystem-backed; any other URL is a
    /// stream source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for empty or oversized locations and
    /// `file:` URLs that do not name a local path.
    pub fn from_location(location: &str) -> Result<Self, ConfigError> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("config location must be non-empty".to_string()));
        }
        if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config location exceeds max length".to_string()));
        }
        match Url::parse(trimmed) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map(Self::File).map_err(|()| {
                ConfigError::Invalid(format!("config location is not a local file: {trimmed}"))
            }),
            // Single-letter schemes are drive prefixes, not URLs.
            Ok(url) if url.scheme().len() > 1 => Ok(Self::Stream(trimmed.to_string())),
            _ => Ok(Self::File(PathBuf::from(trimmed))),
        }
    }

    /// Returns true when the source is filesystem-backed.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stream(location) => f.write_str(location),
        }
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

/// Closed set of environment property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EnvironmentPropertyName {
    /// URI of the directory containing the configuration file.
    #[serde(rename = "PARENT_DIR")]
    ParentDir,
}

impl EnvironmentPropertyName {
    /// All property names.
    pub const ALL: [Self; 1] = [Self::ParentDir];

    /// Returns the property key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParentDir => "PARENT_DIR",
        }
    }

    /// Returns the `${NAME}` placeholder form.
    #[must_use]
    pub fn placeholder(self) -> String {
        format!("${{{}}}", self.as_str())
    }
}

impl fmt::Display for EnvironmentPropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable property map handed to every extension instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvironmentProperties {
    /// Present properties.
    values: BTreeMap<EnvironmentPropertyName, String>,
}

impl EnvironmentProperties {
    /// Returns an empty property map.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Returns the value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: EnvironmentPropertyName) -> Option<&str> {
        self.values.get(&name).map(String::as_str)
    }

    /// Returns true when no property is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over present properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (EnvironmentPropertyName, &str)> {
        self.values.iter().map(|(name, value)| (*name, value.as_str()))
    }

    /// Replaces `${NAME}` placeholders of present properties in `input`.
    #[must_use]
    pub fn replace_placeholders(&self, input: &str) -> String {
        let mut output = input.to_string();
        for (name, value) in &self.values {
            let placeholder = name.placeholder();
            if output.contains(&placeholder) {
                output = output.replace(&placeholder, value);
            }
        }
        output
    }
}

/// Derives the environment properties of a configuration source.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the working directory is unavailable for a
/// relative path, and [`ConfigError::Invalid`] when the directory cannot be
/// expressed as a URI.
pub fn derive_properties(source: &ConfigSource) -> Result<EnvironmentProperties, ConfigError> {
    let ConfigSource::File(path) = source else {
        return Ok(EnvironmentProperties::empty());
    };
    let absolute = std::path::absolute(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    let Some(parent) = absolute.parent() else {
        return Ok(EnvironmentProperties::empty());
    };
    let url = Url::from_directory_path(parent).map_err(|()| {
        ConfigError::Invalid(format!("config directory is not a valid uri: {}", parent.display()))
    })?;
    let mut values = BTreeMap::new();
    values.insert(EnvironmentPropertyName::ParentDir, url.to_string());
    Ok(EnvironmentProperties {
        values,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
