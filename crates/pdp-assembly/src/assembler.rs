// crates/pdp-assembly/src/assembler.rs
// ============================================================================
// Module: PDP Configuration Assembler
// Description: Staged assembly of a PDP engine from its configuration.
// Purpose: Resolve, validate, and merge registries, then own engine resources.
// Dependencies: pdp-config, pdp-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Assembly is a strictly ordered pipeline with no retries:
//!
//! `ReceivedConfig → DatatypesResolved → FunctionsResolved →
//! CombiningAlgsResolved → LimitsResolved → PropertiesResolved →
//! EngineConstructed`
//!
//! Each extension identifier is resolved through the [`ExtensionLoader`]
//! before its registry is merged; function extensions also pass the
//! capability gate. The first failure aborts the assembly. Validation and
//! resolution failures end in `RejectedInvalidConfig`; an unreadable
//! configuration file ends in `RejectedIoFailure`. A resource failure
//! closes every resource already opened, in reverse order, and ends in
//! `RejectedIoFailure` with the original cause and every cleanup failure
//! attached.
//!
//! Assembly is synchronous and single-threaded. The standard catalogue is
//! process-scoped state handed in at construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use pdp_config::CONFIG_ENV_VAR;
use pdp_config::ConfigError;
use pdp_config::ConfigSource;
use pdp_config::EnvironmentProperties;
use pdp_config::ExtensionConfig;
use pdp_config::PdpConfig;
use pdp_config::derive_properties;
use pdp_config::resolve_limit;
use pdp_config::resolve_path;
use pdp_core::Capability;
use pdp_core::Extension;
use pdp_core::Function;
use pdp_core::HashDigest;
use pdp_core::HashError;
use pdp_core::MergePolicy;
use pdp_core::RegistryError;
use pdp_core::StandardCatalog;
use pdp_core::hash_canonical_json;
use pdp_core::is_capability_dependent;
use pdp_core::merge_functions;
use pdp_core::merge_registry;
use serde::Serialize;
use thiserror::Error;

use crate::audit::AssemblyAuditEvent;
use crate::audit::AssemblyAuditSink;
use crate::audit::AssemblyStageEvent;
use crate::audit::NoopAuditSink;
use crate::engine::EngineLimits;
use crate::engine::EngineResource;
use crate::engine::EngineSettings;
use crate::engine::PdpEngine;
use crate::engine::Registries;
use crate::engine::close_in_reverse;
use crate::loader::DecisionResultFilter;
use crate::loader::ExtensionError;
use crate::loader::ExtensionLoader;
use crate::resources::ResourceError;
use crate::resources::ResourceFactory;
use crate::resources::ResourceRequest;
use crate::resources::ResourceRole;

// ============================================================================
// SECTION: States
// ============================================================================

/// Assembly pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyState {
    /// Configuration accepted for assembly.
    ReceivedConfig,
    /// Datatype registry sealed.
    DatatypesResolved,
    /// Function registry sealed.
    FunctionsResolved,
    /// Combining algorithm registry sealed.
    CombiningAlgsResolved,
    /// Depth limits resolved.
    LimitsResolved,
    /// Environment properties derived.
    PropertiesResolved,
    /// Engine constructed and owning its resources.
    EngineConstructed,
    /// Rejected before any resource was held.
    RejectedInvalidConfig,
    /// Rejected after a resource failure; opened resources were closed.
    RejectedIoFailure,
}

impl AssemblyState {
    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceivedConfig => "received_config",
            Self::DatatypesResolved => "datatypes_resolved",
            Self::FunctionsResolved => "functions_resolved",
            Self::CombiningAlgsResolved => "combining_algs_resolved",
            Self::LimitsResolved => "limits_resolved",
            Self::PropertiesResolved => "properties_resolved",
            Self::EngineConstructed => "engine_constructed",
            Self::RejectedInvalidConfig => "rejected_invalid_config",
            Self::RejectedIoFailure => "rejected_io_failure",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classification of assembly failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyErrorKind {
    /// Present but semantically invalid configuration.
    InvalidConfig,
    /// An identifier did not resolve to a live implementation.
    ExtensionResolution,
    /// A resource or configuration read failed.
    ResourceIo,
}

/// Assembly errors.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Two different instances share one identifier.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A function extension needs a capability the configuration disables.
    #[error(
        "{capability}-based function not allowed ({flag} = false): {id}",
        flag = .capability.config_flag()
    )]
    CapabilityDisabled {
        /// Disabled capability.
        capability: Capability,
        /// Offending function identifier.
        id: String,
    },
    /// An identifier did not resolve.
    #[error(transparent)]
    Extension(#[from] ExtensionError),
    /// A resource failed to open; already-opened resources were closed.
    #[error("{source}")]
    Resource {
        /// Original failure.
        #[source]
        source: ResourceError,
        /// Failures raised while closing already-opened resources.
        cleanup_failures: Vec<ResourceError>,
    },
}

impl AssemblyError {
    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> AssemblyErrorKind {
        match self {
            Self::Config(ConfigError::Io(_)) | Self::Resource {
                ..
            } => AssemblyErrorKind::ResourceIo,
            Self::Config(_)
            | Self::Registry(_)
            | Self::CapabilityDisabled {
                ..
            } => AssemblyErrorKind::InvalidConfig,
            Self::Extension(_) => AssemblyErrorKind::ExtensionResolution,
        }
    }

    /// Returns the terminal state reached by the failed assembly.
    #[must_use]
    pub const fn terminal_state(&self) -> AssemblyState {
        match self.kind() {
            AssemblyErrorKind::ResourceIo => AssemblyState::RejectedIoFailure,
            AssemblyErrorKind::InvalidConfig | AssemblyErrorKind::ExtensionResolution => {
                AssemblyState::RejectedInvalidConfig
            }
        }
    }
}

// ============================================================================
// SECTION: Assembler
// ============================================================================

/// Assembles PDP engines from configuration.
///
/// # Invariants
/// - Holds no per-assembly state; one assembler serves many assemblies.
pub struct PdpAssembler {
    /// Process-scoped standard catalogue.
    catalog: Arc<StandardCatalog>,
    /// Extension resolution.
    loader: Arc<dyn ExtensionLoader>,
    /// Resource construction.
    resources: Arc<dyn ResourceFactory>,
    /// Audit event destination.
    audit: Arc<dyn AssemblyAuditSink>,
}

impl PdpAssembler {
    /// Creates an assembler with a no-op audit sink.
    #[must_use]
    pub fn new(
        catalog: Arc<StandardCatalog>,
        loader: Arc<dyn ExtensionLoader>,
        resources: Arc<dyn ResourceFactory>,
    ) -> Self {
        Self {
            catalog,
            loader,
            resources,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AssemblyAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Loads the configuration file and assembles an engine.
    ///
    /// The path resolves like [`PdpConfig::load`]; `PARENT_DIR` is derived
    /// from the resolved path.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when loading or assembly fails.
    pub fn assemble_from_path(&self, path: Option<&Path>) -> Result<PdpEngine, AssemblyError> {
        self.assemble_resolved(resolve_path(path))
    }

    /// Loads and assembles from an already resolved configuration path.
    fn assemble_resolved(
        &self,
        resolved: Result<PathBuf, ConfigError>,
    ) -> Result<PdpEngine, AssemblyError> {
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                let err = AssemblyError::from(err);
                self.record_rejection(CONFIG_ENV_VAR, AssemblyState::ReceivedConfig, &err);
                return Err(err);
            }
        };
        let loaded = PdpConfig::load_file(&resolved);
        let source = ConfigSource::File(resolved);
        match loaded {
            Ok(config) => self.assemble(&config, &source),
            Err(err) => {
                let err = AssemblyError::from(err);
                self.record_rejection(&source.to_string(), AssemblyState::ReceivedConfig, &err);
                Err(err)
            }
        }
    }

    /// Parses configuration text read from `location` and assembles an engine.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when parsing or assembly fails.
    pub fn assemble_from_str(
        &self,
        content: &str,
        location: &str,
    ) -> Result<PdpEngine, AssemblyError> {
        let source = ConfigSource::from_location(location)?;
        match PdpConfig::from_toml_str(content) {
            Ok(config) => self.assemble(&config, &source),
            Err(err) => {
                let err = AssemblyError::from(err);
                self.record_rejection(&source.to_string(), AssemblyState::ReceivedConfig, &err);
                Err(err)
            }
        }
    }

    /// Assembles an engine from a loaded configuration and its source.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] on the first failing stage.
    pub fn assemble(
        &self,
        config: &PdpConfig,
        source: &ConfigSource,
    ) -> Result<PdpEngine, AssemblyError> {
        let mut reached = AssemblyState::ReceivedConfig;
        match self.run(config, source, &mut reached) {
            Ok(engine) => {
                self.audit.record(&AssemblyAuditEvent::constructed(source.to_string()));
                Ok(engine)
            }
            Err(err) => {
                self.record_rejection(&source.to_string(), reached, &err);
                Err(err)
            }
        }
    }

    /// Resolves and merges the three registries without opening resources.
    ///
    /// Records a terminal `resolved` or `rejected` event for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when an identifier does not resolve, a
    /// function needs a disabled capability, or identifiers conflict.
    pub fn resolve_registries(
        &self,
        config: &PdpConfig,
        source: &ConfigSource,
    ) -> Result<Registries, AssemblyError> {
        let mut reached = AssemblyState::ReceivedConfig;
        match self.resolve_registries_tracked(config, &mut reached) {
            Ok(registries) => {
                self.audit.record(&AssemblyAuditEvent::resolved(source.to_string()));
                Ok(registries)
            }
            Err(err) => {
                self.record_rejection(&source.to_string(), reached, &err);
                Err(err)
            }
        }
    }

    /// Resolves both depth limits.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Config`] naming the field whose value does not
    /// fit the bounded range.
    pub fn resolve_limits(config: &PdpConfig) -> Result<EngineLimits, AssemblyError> {
        Ok(EngineLimits {
            max_variable_ref_depth: resolve_limit(
                "max_variable_ref_depth",
                config.max_variable_ref_depth.as_ref(),
            )?,
            max_policy_ref_depth: resolve_limit(
                "max_policy_ref_depth",
                config.max_policy_ref_depth.as_ref(),
            )?,
        })
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    /// Runs every stage, recording the last completed one in `reached`.
    fn run(
        &self,
        config: &PdpConfig,
        source: &ConfigSource,
        reached: &mut AssemblyState,
    ) -> Result<PdpEngine, AssemblyError> {
        let registries = self.resolve_registries_tracked(config, reached)?;

        let limits = Self::resolve_limits(config)?;
        let mut event = AssemblyStageEvent::new(AssemblyState::LimitsResolved);
        event.limits = Some(limits);
        self.complete_stage(reached, &event);

        let properties = derive_properties(source)?;
        let mut event = AssemblyStageEvent::new(AssemblyState::PropertiesResolved);
        event.properties = Some(properties.clone());
        self.complete_stage(reached, &event);

        let result_filter = self.resolve_result_filter(config)?;
        let resources = self.open_resources(config, &registries, &properties)?;
        let engine = PdpEngine::new(
            registries,
            limits,
            properties,
            EngineSettings::from(config),
            result_filter,
            resources,
        );
        self.complete_stage(reached, &AssemblyStageEvent::new(AssemblyState::EngineConstructed));
        Ok(engine)
    }

    /// Resolves the registries, recording progress in `reached`.
    fn resolve_registries_tracked(
        &self,
        config: &PdpConfig,
        reached: &mut AssemblyState,
    ) -> Result<Registries, AssemblyError> {
        let xpath = config.enable_xpath;

        let extensions = config
            .datatypes
            .iter()
            .map(|id| self.loader.datatype(id))
            .collect::<Result<Vec<_>, _>>()?;
        let datatypes = merge_registry(
            config.use_standard_datatypes,
            self.catalog.datatypes(xpath),
            &extensions,
        )?;
        let event = registry_stage_event(
            AssemblyState::DatatypesResolved,
            datatypes.policy,
            datatypes.registry.len(),
            datatypes.registry.fingerprint(),
        );
        self.complete_stage(reached, &event);

        let mut extensions = Vec::with_capacity(config.functions.len());
        for id in &config.functions {
            let function = Arc::new(Function::from(self.loader.function(id)?.as_ref().clone()));
            if !xpath && is_capability_dependent(function.as_ref(), Capability::XPath) {
                return Err(AssemblyError::CapabilityDisabled {
                    capability: Capability::XPath,
                    id: function.id().to_string(),
                });
            }
            extensions.push(function);
        }
        let functions = merge_functions(
            config.use_standard_functions,
            self.catalog.functions(xpath),
            &extensions,
        )?;
        let event = registry_stage_event(
            AssemblyState::FunctionsResolved,
            functions.policy,
            functions.registry.non_generic().len(),
            functions.registry.fingerprint().and_then(|fp| hash_canonical_json(&fp)),
        );
        self.complete_stage(reached, &event);

        let extensions = config
            .combining_algorithms
            .iter()
            .map(|id| self.loader.combining_algorithm(id))
            .collect::<Result<Vec<_>, _>>()?;
        let combining_algorithms = merge_registry(
            config.use_standard_combining_algorithms,
            self.catalog.combining_algorithms(),
            &extensions,
        )?;
        let event = registry_stage_event(
            AssemblyState::CombiningAlgsResolved,
            combining_algorithms.policy,
            combining_algorithms.registry.len(),
            combining_algorithms.registry.fingerprint(),
        );
        self.complete_stage(reached, &event);

        Ok(Registries {
            datatypes: datatypes.registry,
            functions: functions.registry,
            combining_algorithms: combining_algorithms.registry,
        })
    }

    /// Resolves the optional result filter.
    fn resolve_result_filter(
        &self,
        config: &PdpConfig,
    ) -> Result<Option<Arc<dyn DecisionResultFilter>>, AssemblyError> {
        config
            .result_filter
            .as_deref()
            .map(|id| self.loader.result_filter(id))
            .transpose()
            .map_err(AssemblyError::from)
    }

    /// Opens every configured resource in engine order.
    ///
    /// On failure, closes what was opened in reverse order before returning.
    fn open_resources(
        &self,
        config: &PdpConfig,
        registries: &Registries,
        properties: &EnvironmentProperties,
    ) -> Result<Vec<EngineResource>, AssemblyError> {
        let mut planned: Vec<(ResourceRole, &ExtensionConfig)> = config
            .attribute_providers
            .iter()
            .enumerate()
            .map(|(index, provider)| {
                (
                    ResourceRole::AttributeProvider {
                        index,
                    },
                    provider,
                )
            })
            .collect();
        planned.push((ResourceRole::RootPolicyProvider, &config.root_policy_provider));
        if let Some(provider) = &config.ref_policy_provider {
            planned.push((ResourceRole::RefPolicyProvider, provider));
        }
        if let Some(cache) = &config.decision_cache {
            planned.push((ResourceRole::DecisionCache, cache));
        }

        let mut opened = Vec::with_capacity(planned.len());
        for (role, extension) in planned {
            let request = ResourceRequest {
                role,
                config: extension,
                registries,
                properties,
            };
            match self.resources.open(&request) {
                Ok(resource) => opened.push(EngineResource {
                    role,
                    extension: extension.extension.clone(),
                    resource,
                }),
                Err(source) => {
                    let cleanup_failures = close_in_reverse(&mut opened);
                    return Err(AssemblyError::Resource {
                        source,
                        cleanup_failures,
                    });
                }
            }
        }
        Ok(opened)
    }

    // ------------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------------

    /// Marks a stage completed and records its event.
    fn complete_stage(&self, reached: &mut AssemblyState, event: &AssemblyStageEvent) {
        *reached = event.stage;
        self.audit.record_stage(event);
    }

    /// Records a terminal rejection event.
    fn record_rejection(&self, source: &str, reached: AssemblyState, err: &AssemblyError) {
        self.audit.record(&AssemblyAuditEvent::rejected(
            source.to_string(),
            err.terminal_state(),
            reached,
            err.kind(),
            err.to_string(),
        ));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a registry stage event.
///
/// A fingerprint that cannot be computed is reported in `fingerprint_error`.
fn registry_stage_event(
    stage: AssemblyState,
    policy: MergePolicy,
    entries: usize,
    fingerprint: Result<HashDigest, HashError>,
) -> AssemblyStageEvent {
    let mut event = AssemblyStageEvent::new(stage);
    event.merge_policy = Some(policy);
    event.entries = Some(entries);
    match fingerprint {
        Ok(digest) => event.fingerprint = Some(digest),
        Err(err) => event.fingerprint_error = Some(err.to_string()),
    }
    event
}

// ============================================================================
// SECTION: Tests
// ============================================================================
