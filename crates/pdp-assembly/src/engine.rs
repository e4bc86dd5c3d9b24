// crates/pdp-assembly/src/engine.rs
// ============================================================================
// Module: PDP Engine Handle
// Description: Assembled engine state and resource ownership.
// Purpose: Hold everything an evaluation engine needs, immutably.
// Dependencies: pdp-config, pdp-core, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`PdpEngine`] is the product of a successful assembly: the three sealed
//! registries, the resolved depth limits, the environment properties, the
//! pass-through settings, and every resource opened for it. Registries and
//! properties are immutable and can be read concurrently without
//! synchronization. Resources are closed explicitly with [`PdpEngine::close`],
//! in reverse opening order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use pdp_config::DepthLimit;
use pdp_config::EnvironmentProperties;
use pdp_config::PdpConfig;
use pdp_config::StandardEnvAttributeSource;
use pdp_core::CombiningAlgRegistry;
use pdp_core::DatatypeRegistry;
use pdp_core::FunctionRegistry;
use pdp_core::FunctionRegistryFingerprint;
use pdp_core::HashDigest;
use pdp_core::HashError;
use serde::Serialize;
use thiserror::Error;

use crate::loader::DecisionResultFilter;
use crate::resources::ManagedResource;
use crate::resources::ResourceError;
use crate::resources::ResourceRole;

// ============================================================================
// SECTION: Registries
// ============================================================================

/// The three sealed registries of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Registries {
    /// Attribute datatypes.
    pub datatypes: Arc<DatatypeRegistry>,
    /// Functions and generic function factories.
    pub functions: Arc<FunctionRegistry>,
    /// Rule and policy combining algorithms.
    pub combining_algorithms: Arc<CombiningAlgRegistry>,
}

/// Content digests of all registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistriesFingerprint {
    /// Datatype registry digest.
    pub datatypes: HashDigest,
    /// Function registry digests.
    pub functions: FunctionRegistryFingerprint,
    /// Combining algorithm registry digest.
    pub combining_algorithms: HashDigest,
}

impl Registries {
    /// Returns the content digests of all registries.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when an entry cannot be canonicalized.
    pub fn fingerprint(&self) -> Result<RegistriesFingerprint, HashError> {
        Ok(RegistriesFingerprint {
            datatypes: self.datatypes.fingerprint()?,
            functions: self.functions.fingerprint()?,
            combining_algorithms: self.combining_algorithms.fingerprint()?,
        })
    }
}

// ============================================================================
// SECTION: Limits and Settings
// ============================================================================

/// Resolved reference-chain depth limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineLimits {
    /// Maximum variable reference depth.
    pub max_variable_ref_depth: DepthLimit,
    /// Maximum policy reference depth.
    pub max_policy_ref_depth: DepthLimit,
}

/// Configuration fields forwarded to the engine unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSettings {
    /// Whether the `XPath` capability is enabled.
    pub enable_xpath: bool,
    /// Strict issuer matching for attribute designators.
    pub strict_attribute_issuer_match: bool,
    /// Source of standard environment attributes.
    pub standard_env_attribute_source: StandardEnvAttributeSource,
    /// Detail level of bad-request status messages.
    pub bad_request_status_detail_level: u32,
    /// Request preprocessing filter identifier.
    pub request_filter: Option<String>,
}

impl From<&PdpConfig> for EngineSettings {
    fn from(config: &PdpConfig) -> Self {
        Self {
            enable_xpath: config.enable_xpath,
            strict_attribute_issuer_match: config.strict_attribute_issuer_match,
            standard_env_attribute_source: config.standard_env_attribute_source,
            bad_request_status_detail_level: config.bad_request_status_detail_level,
            request_filter: config.request_filter.clone(),
        }
    }
}

// ============================================================================
// SECTION: Resources
// ============================================================================

/// Resource owned by the engine.
#[derive(Debug)]
pub struct EngineResource {
    /// Role of the resource.
    pub role: ResourceRole,
    /// Configured extension identifier.
    pub extension: String,
    /// Live resource.
    pub resource: Box<dyn ManagedResource>,
}

impl EngineResource {
    /// Closes the resource, tagging failures with role and extension.
    pub(crate) fn close(&mut self) -> Result<(), ResourceError> {
        self.resource.close().map_err(|err| ResourceError::Close {
            role: self.role,
            extension: self.extension.clone(),
            message: err.to_string(),
        })
    }
}

/// Closes `resources` in reverse order, collecting every failure.
pub(crate) fn close_in_reverse(resources: &mut Vec<EngineResource>) -> Vec<ResourceError> {
    let mut failures = Vec::new();
    while let Some(mut resource) = resources.pop() {
        if let Err(err) = resource.close() {
            failures.push(err);
        }
    }
    failures
}

/// Failures reported while closing an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} engine resources failed to close", failures.len())]
pub struct EngineCloseError {
    /// Close failures in closing order.
    pub failures: Vec<ResourceError>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Fully assembled PDP engine.
///
/// # Invariants
/// - Registries and properties never change after assembly.
/// - Resources are listed in opening order.
#[derive(Debug)]
pub struct PdpEngine {
    /// Sealed registries.
    registries: Registries,
    /// Resolved depth limits.
    limits: EngineLimits,
    /// Environment properties of the assembly.
    properties: EnvironmentProperties,
    /// Pass-through settings.
    settings: EngineSettings,
    /// Resolved decision result filter.
    result_filter: Option<Arc<dyn DecisionResultFilter>>,
    /// Owned resources, in opening order.
    resources: Vec<EngineResource>,
}

impl PdpEngine {
    /// Creates an engine from assembled parts.
    #[must_use]
    pub(crate) const fn new(
        registries: Registries,
        limits: EngineLimits,
        properties: EnvironmentProperties,
        settings: EngineSettings,
        result_filter: Option<Arc<dyn DecisionResultFilter>>,
        resources: Vec<EngineResource>,
    ) -> Self {
        Self {
            registries,
            limits,
            properties,
            settings,
            result_filter,
            resources,
        }
    }

    /// Returns the sealed registries.
    #[must_use]
    pub const fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Returns the resolved depth limits.
    #[must_use]
    pub const fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Returns the environment properties.
    #[must_use]
    pub const fn properties(&self) -> &EnvironmentProperties {
        &self.properties
    }

    /// Returns the pass-through settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the decision result filter, if configured.
    #[must_use]
    pub fn result_filter(&self) -> Option<&dyn DecisionResultFilter> {
        self.result_filter.as_deref()
    }

    /// Returns the owned resources in opening order.
    #[must_use]
    pub fn resources(&self) -> &[EngineResource] {
        &self.resources
    }

    /// Returns the roles of the owned resources in opening order.
    pub fn resource_roles(&self) -> impl Iterator<Item = ResourceRole> + '_ {
        self.resources.iter().map(|resource| resource.role)
    }

    /// Closes every owned resource in reverse opening order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineCloseError`] listing every resource that failed to
    /// close; the remaining resources are still closed.
    pub fn close(mut self) -> Result<(), EngineCloseError> {
        let failures = close_in_reverse(&mut self.resources);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineCloseError {
                failures,
            })
        }
    }
}
