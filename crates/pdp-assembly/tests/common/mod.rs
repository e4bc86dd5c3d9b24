// crates/pdp-assembly/tests/common/mod.rs
// =============================================================================
// Module: Assembly Test Helpers
// Description: Recording resource factory, audit sink, and config fixtures.
// Purpose: Reduce duplication across integration tests for pdp-assembly.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use pdp_assembly::AssemblyAuditEvent;
use pdp_assembly::AssemblyAuditSink;
use pdp_assembly::AssemblyStageEvent;
use pdp_assembly::AssemblyState;
use pdp_assembly::DecisionResultFilter;
use pdp_assembly::ManagedResource;
use pdp_assembly::PdpAssembler;
use pdp_assembly::ResourceError;
use pdp_assembly::ResourceFactory;
use pdp_assembly::ResourceRequest;
use pdp_assembly::ResourceRole;
use pdp_assembly::StaticExtensionLoader;
use pdp_config::ConfigError;
use pdp_config::PdpConfig;
use pdp_core::CombinableKind;
use pdp_core::CombiningAlg;
use pdp_core::DatatypeFactory;
use pdp_core::FirstOrderFunction;
use pdp_core::ParameterType;
use pdp_core::StandardCatalog;
use pdp_core::datatypes;

// =============================================================================
// Identifiers
// =============================================================================

/// Custom datatype that collides with nothing.
pub const GEO_POINT: &str = "urn:example:datatype:geo-point";
/// Custom function that collides with nothing.
pub const GEO_WITHIN: &str = "urn:example:function:geo-within";
/// Custom function taking a path-query expression.
pub const XPATH_DEPTH: &str = "urn:example:function:xpath-depth";
/// Custom combining algorithm that collides with nothing.
pub const FIRST_PERMIT: &str = "urn:example:alg:first-permit";
/// Standard string equality function.
pub const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
/// Standard deny-overrides rule combining algorithm.
pub const RULE_DENY_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides";
/// Result filter registered in the fixture loader.
pub const COMBINED_FILTER: &str = "urn:example:result-filter:combined";

// =============================================================================
// Journal
// =============================================================================

/// Ordered log of resource lifecycle calls.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    pub fn push(&self, entry: String) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Resource that journals its close call.
#[derive(Debug)]
pub struct RecordingResource {
    name: String,
    journal: Arc<Journal>,
    fail_close: bool,
}

impl ManagedResource for RecordingResource {
    fn close(&mut self) -> io::Result<()> {
        self.journal.push(format!("close {}", self.name));
        if self.fail_close { Err(io::Error::other("close refused")) } else { Ok(()) }
    }
}

/// Factory that journals opens and can fail on chosen roles.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    pub journal: Arc<Journal>,
    pub fail_open: Option<ResourceRole>,
    pub fail_close: Vec<ResourceRole>,
    pub locations: Mutex<Vec<Option<String>>>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(role: ResourceRole, fail_close: Vec<ResourceRole>) -> Arc<Self> {
        Arc::new(Self {
            fail_open: Some(role),
            fail_close,
            ..Self::default()
        })
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.entries()
    }
}

impl ResourceFactory for RecordingFactory {
    fn open(
        &self,
        request: &ResourceRequest<'_>,
    ) -> Result<Box<dyn ManagedResource>, ResourceError> {
        let name = request.role.to_string();
        if self.fail_open == Some(request.role) {
            self.journal.push(format!("fail {name}"));
            return Err(ResourceError::Open {
                role: request.role,
                extension: request.config.extension.clone(),
                message: "connection refused".to_string(),
            });
        }
        self.journal.push(format!("open {name}"));
        self.locations.lock().unwrap().push(request.setting("location"));
        Ok(Box::new(RecordingResource {
            name,
            journal: Arc::clone(&self.journal),
            fail_close: self.fail_close.contains(&request.role),
        }))
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    pub stages: Mutex<Vec<AssemblyStageEvent>>,
    pub outcomes: Mutex<Vec<AssemblyAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn stage_names(&self) -> Vec<AssemblyState> {
        self.stages.lock().unwrap().iter().map(|event| event.stage).collect()
    }

    pub fn last_outcome(&self) -> AssemblyAuditEvent {
        self.outcomes.lock().unwrap().last().cloned().unwrap()
    }
}

impl AssemblyAuditSink for RecordingAuditSink {
    fn record(&self, event: &AssemblyAuditEvent) {
        self.outcomes.lock().unwrap().push(event.clone());
    }

    fn record_stage(&self, event: &AssemblyStageEvent) {
        self.stages.lock().unwrap().push(event.clone());
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Result filter fixture.
#[derive(Debug)]
pub struct NamedFilter(pub &'static str);

impl DecisionResultFilter for NamedFilter {
    fn id(&self) -> &str {
        self.0
    }
}

/// Loader with non-colliding and colliding extensions for every point.
pub fn fixture_loader() -> StaticExtensionLoader {
    StaticExtensionLoader::new()
        .with_datatype(DatatypeFactory::new(GEO_POINT, "urn:example:function:geo-point"))
        // Same identifier as the standard string datatype, different function prefix.
        .with_datatype(DatatypeFactory::new(datatypes::STRING, "urn:example:function:string"))
        .with_function(FirstOrderFunction::new(
            GEO_WITHIN,
            ParameterType::primitive(datatypes::BOOLEAN),
            vec![ParameterType::primitive(GEO_POINT), ParameterType::primitive(GEO_POINT)],
        ))
        .with_function(FirstOrderFunction::new(
            XPATH_DEPTH,
            ParameterType::primitive(datatypes::INTEGER),
            vec![ParameterType::primitive(datatypes::XPATH_EXPRESSION)],
        ))
        // Same identifier as standard string-equal, different signature.
        .with_function(FirstOrderFunction::new(
            STRING_EQUAL,
            ParameterType::primitive(datatypes::BOOLEAN),
            vec![ParameterType::primitive(datatypes::STRING)],
        ))
        .with_combining_algorithm(CombiningAlg::new(FIRST_PERMIT, CombinableKind::Policy))
        // Same identifier as the standard algorithm, flagged legacy.
        .with_combining_algorithm(CombiningAlg::legacy(RULE_DENY_OVERRIDES, CombinableKind::Rule))
        .with_result_filter(Arc::new(NamedFilter(COMBINED_FILTER)))
}

// =============================================================================
// Configs and Assemblers
// =============================================================================

/// Parses `top_level` keys followed by a root policy provider table.
pub fn config_with(top_level: &str) -> Result<PdpConfig, ConfigError> {
    PdpConfig::from_toml_str(&format!(
        "{top_level}\n[root_policy_provider]\nextension = \"urn:example:policy-provider:static\"\n\
         settings = {{ location = \"${{PARENT_DIR}}policies/\" }}\n"
    ))
}

/// Returns a config with every default.
pub fn minimal_config() -> PdpConfig {
    config_with("").unwrap()
}

/// Builds a shared standard catalogue.
pub fn catalog() -> Arc<StandardCatalog> {
    Arc::new(StandardCatalog::new().unwrap())
}

/// Builds an assembler over the fixture loader.
pub fn assembler(
    catalog: &Arc<StandardCatalog>,
    factory: &Arc<RecordingFactory>,
    sink: &Arc<RecordingAuditSink>,
) -> PdpAssembler {
    let resources: Arc<dyn ResourceFactory> = Arc::clone(factory) as Arc<dyn ResourceFactory>;
    let audit: Arc<dyn AssemblyAuditSink> = Arc::clone(sink) as Arc<dyn AssemblyAuditSink>;
    PdpAssembler::new(Arc::clone(catalog), Arc::new(fixture_loader()), resources)
        .with_audit_sink(audit)
}
