// crates/pdp-assembly/src/loader.rs
// ============================================================================
// Module: Extension Loader
// Description: Contract resolving extension identifiers to live instances.
// Purpose: Decouple registry assembly from extension discovery.
// Dependencies: pdp-core, thiserror
// ============================================================================

//! ## Overview
//! The assembler never discovers extensions itself. It asks an
//! [`ExtensionLoader`] for each configured identifier, one typed method per
//! extensibility point, and aborts the whole assembly on the first identifier
//! that does not resolve.
//!
//! Function extensions are first-order only: higher-order functions are a
//! fixed standard set, so the function contract cannot yield one.
//!
//! [`StaticExtensionLoader`] is an in-memory loader keyed by identifier; it
//! backs tests, the CLI, and embedders that link their extensions statically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pdp_core::CombiningAlg;
use pdp_core::DatatypeFactory;
use pdp_core::Extension;
use pdp_core::ExtensionKind;
use pdp_core::FirstOrderFunction;
use thiserror::Error;

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// Post-processing applied to decision results before they are returned.
pub trait DecisionResultFilter: fmt::Debug + Send + Sync {
    /// Returns the filter identifier.
    fn id(&self) -> &str;
}

/// Resolves extension identifiers to instances.
///
/// # Invariants
/// - Resolution is side-effect free from the assembler's point of view.
/// - An unknown identifier yields [`ExtensionError::NotFound`].
pub trait ExtensionLoader: Send + Sync {
    /// Resolves a datatype factory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when the identifier does not resolve.
    fn datatype(&self, id: &str) -> Result<Arc<DatatypeFactory>, ExtensionError>;

    /// Resolves a non-generic first-order function.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when the identifier does not resolve.
    fn function(&self, id: &str) -> Result<Arc<FirstOrderFunction>, ExtensionError>;

    /// Resolves a combining algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when the identifier does not resolve.
    fn combining_algorithm(&self, id: &str) -> Result<Arc<CombiningAlg>, ExtensionError>;

    /// Resolves a decision result filter.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] when the identifier does not resolve.
    fn result_filter(&self, id: &str) -> Result<Arc<dyn DecisionResultFilter>, ExtensionError>;
}

/// Extension resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
    /// No extension is registered under the identifier.
    #[error("no such {kind} extension: {id}")]
    NotFound {
        /// Extensibility point that was queried.
        kind: ExtensionKind,
        /// Unresolved identifier.
        id: String,
    },
    /// The loader failed while instantiating the extension.
    #[error("failed to load {kind} extension {id}: {message}")]
    Load {
        /// Extensibility point that was queried.
        kind: ExtensionKind,
        /// Identifier being loaded.
        id: String,
        /// Loader-specific failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Static Loader
// ============================================================================

/// In-memory loader over statically linked extensions.
#[derive(Debug, Default, Clone)]
pub struct StaticExtensionLoader {
    /// Datatype factories by identifier.
    datatypes: BTreeMap<String, Arc<DatatypeFactory>>,
    /// Functions by identifier.
    functions: BTreeMap<String, Arc<FirstOrderFunction>>,
    /// Combining algorithms by identifier.
    combining_algorithms: BTreeMap<String, Arc<CombiningAlg>>,
    /// Result filters by identifier.
    result_filters: BTreeMap<String, Arc<dyn DecisionResultFilter>>,
}

impl StaticExtensionLoader {
    /// Creates an empty loader; every lookup fails with `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a datatype factory under its own identifier.
    #[must_use]
    pub fn with_datatype(mut self, datatype: DatatypeFactory) -> Self {
        self.datatypes.insert(datatype.id().to_string(), Arc::new(datatype));
        self
    }

    /// Adds a function under its own identifier.
    #[must_use]
    pub fn with_function(mut self, function: FirstOrderFunction) -> Self {
        self.functions.insert(function.id.as_str().to_string(), Arc::new(function));
        self
    }

    /// Adds a combining algorithm under its own identifier.
    #[must_use]
    pub fn with_combining_algorithm(mut self, algorithm: CombiningAlg) -> Self {
        self.combining_algorithms.insert(algorithm.id().to_string(), Arc::new(algorithm));
        self
    }

    /// Adds a result filter under its own identifier.
    #[must_use]
    pub fn with_result_filter(mut self, filter: Arc<dyn DecisionResultFilter>) -> Self {
        self.result_filters.insert(filter.id().to_string(), filter);
        self
    }
}

/// Looks up `id` in `map`, failing with `NotFound` for `kind`.
fn lookup<T: ?Sized>(
    map: &BTreeMap<String, Arc<T>>,
    kind: ExtensionKind,
    id: &str,
) -> Result<Arc<T>, ExtensionError> {
    map.get(id).cloned().ok_or_else(|| ExtensionError::NotFound {
        kind,
        id: id.to_string(),
    })
}

impl ExtensionLoader for StaticExtensionLoader {
    fn datatype(&self, id: &str) -> Result<Arc<DatatypeFactory>, ExtensionError> {
        lookup(&self.datatypes, ExtensionKind::Datatype, id)
    }

    fn function(&self, id: &str) -> Result<Arc<FirstOrderFunction>, ExtensionError> {
        lookup(&self.functions, ExtensionKind::Function, id)
    }

    fn combining_algorithm(&self, id: &str) -> Result<Arc<CombiningAlg>, ExtensionError> {
        lookup(&self.combining_algorithms, ExtensionKind::CombiningAlgorithm, id)
    }

    fn result_filter(&self, id: &str) -> Result<Arc<dyn DecisionResultFilter>, ExtensionError> {
        lookup(&self.result_filters, ExtensionKind::ResultFilter, id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use pdp_core::CombinableKind;
    use pdp_core::ParameterType;

    use super::*;

    #[test]
    fn empty_loader_reports_kind_and_identifier() {
        let loader = StaticExtensionLoader::new();
        let err = loader.combining_algorithm("urn:example:alg").unwrap_err();
        assert_eq!(
            err,
            ExtensionError::NotFound {
                kind: ExtensionKind::CombiningAlgorithm,
                id: "urn:example:alg".to_string(),
            }
        );
        assert_eq!(err.to_string(), "no such combining_algorithm extension: urn:example:alg");
    }

    #[test]
    fn registered_extensions_resolve_by_identifier() {
        let loader = StaticExtensionLoader::new()
            .with_combining_algorithm(CombiningAlg::new("urn:example:alg", CombinableKind::Rule));
        let alg = loader.combining_algorithm("urn:example:alg").unwrap();
        assert_eq!(alg.combines, CombinableKind::Rule);
        assert!(loader.datatype("urn:example:alg").is_err());
    }

    #[test]
    fn function_extensions_resolve_with_their_signature() {
        let signature = FirstOrderFunction::new(
            "urn:example:function:geo-within",
            ParameterType::primitive("urn:oasis:names:tc:xacml:1.0:data-type:boolean"),
            vec![ParameterType::primitive("urn:example:datatype:geo-point")],
        );
        let loader = StaticExtensionLoader::new().with_function(signature.clone());
        let function = loader.function("urn:example:function:geo-within").unwrap();
        assert_eq!(*function, signature);
        assert!(loader.function("urn:oasis:names:tc:xacml:3.0:function:any-of").is_err());
    }
}
