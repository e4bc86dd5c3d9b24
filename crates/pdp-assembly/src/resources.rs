// crates/pdp-assembly/src/resources.rs
// ============================================================================
// Module: Managed Resources
// Description: Contracts for externally provided, closeable engine resources.
// Purpose: Let the assembler open providers and caches and own their cleanup.
// Dependencies: pdp-config, serde, thiserror
// ============================================================================

//! ## Overview
//! Attribute providers, policy providers, and the decision cache are built by
//! an external [`ResourceFactory`] from their verbatim configuration. Each
//! opened resource is a [`ManagedResource`]: the engine owns it after a
//! successful assembly, and the assembler closes it when a later step fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io;

use pdp_config::EnvironmentProperties;
use pdp_config::ExtensionConfig;
use serde::Serialize;
use thiserror::Error;

use crate::engine::Registries;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Role a resource plays in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ResourceRole {
    /// Attribute provider at `index` in configuration order.
    AttributeProvider {
        /// Position in the configured provider list.
        index: usize,
    },
    /// Provider of the root policy.
    RootPolicyProvider,
    /// Resolver for policy references.
    RefPolicyProvider,
    /// Decision result cache.
    DecisionCache,
}

impl fmt::Display for ResourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeProvider {
                index,
            } => write!(f, "attribute provider #{index}"),
            Self::RootPolicyProvider => f.write_str("root policy provider"),
            Self::RefPolicyProvider => f.write_str("ref policy provider"),
            Self::DecisionCache => f.write_str("decision cache"),
        }
    }
}

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// Everything a factory may use to open one resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRequest<'a> {
    /// Role being opened.
    pub role: ResourceRole,
    /// Verbatim configuration of the resource.
    pub config: &'a ExtensionConfig,
    /// Registries assembled so far.
    pub registries: &'a Registries,
    /// Environment properties of this assembly.
    pub properties: &'a EnvironmentProperties,
}

impl ResourceRequest<'_> {
    /// Returns a string setting with environment placeholders substituted.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<String> {
        self.config.setting_str(key).map(|value| self.properties.replace_placeholders(value))
    }
}

/// Closeable resource owned by the engine.
pub trait ManagedResource: fmt::Debug + Send + Sync {
    /// Releases the resource.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when release fails.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens resources from their configuration.
pub trait ResourceFactory: Send + Sync {
    /// Opens the resource described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] when the resource cannot be opened.
    fn open(&self, request: &ResourceRequest<'_>)
    -> Result<Box<dyn ManagedResource>, ResourceError>;
}

/// Resource lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The factory has no implementation for the extension identifier.
    #[error("unsupported {role} extension: {extension}")]
    Unsupported {
        /// Role being opened.
        role: ResourceRole,
        /// Configured extension identifier.
        extension: String,
    },
    /// Opening the resource failed.
    #[error("failed to open {role} {extension}: {message}")]
    Open {
        /// Role being opened.
        role: ResourceRole,
        /// Configured extension identifier.
        extension: String,
        /// Failure description.
        message: String,
    },
    /// Closing the resource failed.
    #[error("failed to close {role} {extension}: {message}")]
    Close {
        /// Role of the resource.
        role: ResourceRole,
        /// Configured extension identifier.
        extension: String,
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================
