// crates/pdp-core/src/registry.rs
// ============================================================================
// Module: Extension Registries
// Description: Sealed registries, their builder, and the built-in/extension merge.
// Purpose: Produce immutable, deduplicated registries for each extensibility point.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Registry`] is sealed: it has no mutation API and is shared behind an
//! [`Arc`] for the lifetime of an engine. Registries are only produced by a
//! [`RegistryBuilder`], the single open type that accepts new entries.
//!
//! [`merge_registry`] and [`merge_functions`] combine a built-in registry with
//! caller-supplied extensions under the policy selected by [`MergePolicy`].
//! Invariants:
//! - No two distinct instances in one registry share a logical identifier.
//! - Equal instances registered twice collapse to one entry.
//! - A built-in registry is returned as-is (same [`Arc`]) when there is
//!   nothing to merge into it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::extension::CombiningAlg;
use crate::extension::DatatypeFactory;
use crate::extension::Extension;
use crate::extension::ExtensionKind;
use crate::extension::Function;
use crate::extension::GenericFunctionFactory;
use crate::hashing::HashDigest;
use crate::hashing::HashError;
use crate::hashing::hash_canonical_json;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two structurally different instances share one logical identifier.
    #[error("conflicting {kind} extensions share identifier: {id}")]
    DuplicateIdentifier {
        /// Extensibility point of the conflicting instances.
        kind: ExtensionKind,
        /// Shared logical identifier.
        id: String,
    },
}

// ============================================================================
// SECTION: Sealed Registry
// ============================================================================

/// Immutable registry of extension instances keyed by logical identifier.
///
/// # Invariants
/// - Identifiers are unique; iteration is in identifier order.
/// - No method mutates the registry after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T: Extension> {
    /// Instances keyed by logical identifier.
    entries: BTreeMap<String, Arc<T>>,
}

impl<T: Extension> Registry<T> {
    /// Returns an empty registry.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the instance registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.entries.get(id)
    }

    /// Returns true when an instance is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no instance is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over instances in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    /// Iterates over identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the canonical content digest of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when an entry cannot be canonicalized.
    pub fn fingerprint(&self) -> Result<HashDigest, HashError> {
        let entries: Vec<&T> = self.entries.values().map(AsRef::as_ref).collect();
        hash_canonical_json(&entries)
    }
}

impl<T: Extension> Default for Registry<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Registry of attribute datatype factories.
pub type DatatypeRegistry = Registry<DatatypeFactory>;

/// Registry of combining algorithms.
pub type CombiningAlgRegistry = Registry<CombiningAlg>;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Outcome of a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The instance was added.
    Added,
    /// An equal instance was already registered; nothing changed.
    AlreadyPresent,
}

/// Open builder producing a sealed [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder<T: Extension> {
    /// Instances keyed by logical identifier.
    entries: BTreeMap<String, Arc<T>>,
}

impl<T: Extension> RegistryBuilder<T> {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a builder seeded with every entry of `registry`.
    #[must_use]
    pub fn from_registry(registry: &Registry<T>) -> Self {
        Self {
            entries: registry.entries.clone(),
        }
    }

    /// Registers an instance under its logical identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateIdentifier`] when a different
    /// instance is already registered under the same identifier.
    pub fn register(&mut self, extension: Arc<T>) -> Result<Registration, RegistryError> {
        match self.entries.entry(extension.id().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(extension);
                Ok(Registration::Added)
            }
            Entry::Occupied(existing) => {
                if existing.get().as_ref() == extension.as_ref() {
                    Ok(Registration::AlreadyPresent)
                } else {
                    Err(RegistryError::DuplicateIdentifier {
                        kind: T::KIND,
                        id: existing.key().clone(),
                    })
                }
            }
        }
    }

    /// Registers every instance in order, stopping at the first conflict.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateIdentifier`] on the first conflict.
    pub fn register_all<I>(&mut self, extensions: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        for extension in extensions {
            self.register(extension)?;
        }
        Ok(())
    }

    /// Returns the number of registered instances so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seals the builder into an immutable registry.
    #[must_use]
    pub fn build(self) -> Registry<T> {
        Registry {
            entries: self.entries,
        }
    }
}

impl<T: Extension> Default for RegistryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Function Registry
// ============================================================================

/// Registry of non-generic functions plus generic function factories.
///
/// # Invariants
/// - Only non-generic functions are accepted as configuration extensions.
/// - The generic factory set is carried over unchanged from the built-ins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionRegistry {
    /// Fully concrete functions.
    non_generic: Registry<Function>,
    /// Parametric function families.
    generic_factories: Registry<GenericFunctionFactory>,
}

/// Digests of both halves of a function registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRegistryFingerprint {
    /// Digest of the non-generic functions.
    pub non_generic: HashDigest,
    /// Digest of the generic function factories.
    pub generic_factories: HashDigest,
}

impl FunctionRegistry {
    /// Creates a function registry from its two sealed halves.
    #[must_use]
    pub const fn new(
        non_generic: Registry<Function>,
        generic_factories: Registry<GenericFunctionFactory>,
    ) -> Self {
        Self {
            non_generic,
            generic_factories,
        }
    }

    /// Returns the non-generic functions.
    #[must_use]
    pub const fn non_generic(&self) -> &Registry<Function> {
        &self.non_generic
    }

    /// Returns the generic function factories.
    #[must_use]
    pub const fn generic_factories(&self) -> &Registry<GenericFunctionFactory> {
        &self.generic_factories
    }

    /// Returns the non-generic function registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Function>> {
        self.non_generic.get(id)
    }

    /// Returns the generic function factory registered under `id`.
    #[must_use]
    pub fn generic_factory(&self, id: &str) -> Option<&Arc<GenericFunctionFactory>> {
        self.generic_factories.get(id)
    }

    /// Returns true when neither functions nor factories are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.non_generic.is_empty() && self.generic_factories.is_empty()
    }

    /// Returns the canonical content digests of both halves.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when an entry cannot be canonicalized.
    pub fn fingerprint(&self) -> Result<FunctionRegistryFingerprint, HashError> {
        Ok(FunctionRegistryFingerprint {
            non_generic: self.non_generic.fingerprint()?,
            generic_factories: self.generic_factories.fingerprint()?,
        })
    }
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// How built-ins and extensions combine for one extensibility point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Built-ins are used as-is; there are no extensions.
    BuiltinsOnly,
    /// Built-ins are disabled; only extensions are registered.
    ExtensionsOnly,
    /// Deduplicated union of built-ins and extensions.
    Merged,
}

impl MergePolicy {
    /// Selects the policy for a "use built-ins" flag and an extension count.
    #[must_use]
    pub const fn select(use_builtins: bool, extension_count: usize) -> Self {
        match (use_builtins, extension_count) {
            (false, _) => Self::ExtensionsOnly,
            (true, 0) => Self::BuiltinsOnly,
            (true, _) => Self::Merged,
        }
    }

    /// Returns a stable label for the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuiltinsOnly => "builtins_only",
            Self::ExtensionsOnly => "extensions_only",
            Self::Merged => "merged",
        }
    }
}

/// Result of a registry merge.
#[derive(Debug, Clone)]
pub struct Merged<R> {
    /// Sealed registry.
    pub registry: Arc<R>,
    /// Policy that produced it.
    pub policy: MergePolicy,
}

/// Merges a built-in registry with extension instances.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateIdentifier`] when two different instances
/// would share one identifier.
pub fn merge_registry<T: Extension>(
    use_builtins: bool,
    builtins: &Arc<Registry<T>>,
    extensions: &[Arc<T>],
) -> Result<Merged<Registry<T>>, RegistryError> {
    let policy = MergePolicy::select(use_builtins, extensions.len());
    let registry = match policy {
        MergePolicy::BuiltinsOnly => Arc::clone(builtins),
        MergePolicy::ExtensionsOnly => {
            let mut builder = RegistryBuilder::new();
            builder.register_all(extensions.iter().cloned())?;
            Arc::new(builder.build())
        }
        MergePolicy::Merged => {
            let mut builder = RegistryBuilder::from_registry(builtins);
            builder.register_all(extensions.iter().cloned())?;
            Arc::new(builder.build())
        }
    };
    Ok(Merged {
        registry,
        policy,
    })
}

/// Merges built-in functions with non-generic function extensions.
///
/// Generic factories come from the built-ins when they are used and are
/// empty otherwise.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateIdentifier`] when two different functions
/// would share one identifier.
pub fn merge_functions(
    use_builtins: bool,
    builtins: &Arc<FunctionRegistry>,
    extensions: &[Arc<Function>],
) -> Result<Merged<FunctionRegistry>, RegistryError> {
    let policy = MergePolicy::select(use_builtins, extensions.len());
    let registry = match policy {
        MergePolicy::BuiltinsOnly => Arc::clone(builtins),
        MergePolicy::ExtensionsOnly => {
            let mut builder = RegistryBuilder::new();
            builder.register_all(extensions.iter().cloned())?;
            Arc::new(FunctionRegistry::new(builder.build(), Registry::empty()))
        }
        MergePolicy::Merged => {
            let mut builder = RegistryBuilder::from_registry(builtins.non_generic());
            builder.register_all(extensions.iter().cloned())?;
            Arc::new(FunctionRegistry::new(
                builder.build(),
                builtins.generic_factories().clone(),
            ))
        }
    };
    Ok(Merged {
        registry,
        policy,
    })
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

    use super::*;
    use crate::extension::CombinableKind;

    fn alg(id: &str) -> Arc<CombiningAlg> {
        Arc::new(CombiningAlg::new(id, CombinableKind::Policy))
    }

    #[test]
    fn builder_collapses_equal_instances() {
        let mut builder = RegistryBuilder::new();
        assert_eq!(builder.register(alg("urn:a")), Ok(Registration::Added));
        assert_eq!(builder.register(alg("urn:a")), Ok(Registration::AlreadyPresent));
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn builder_rejects_conflicting_instances() {
        let mut builder = RegistryBuilder::new();
        builder.register(alg("urn:a")).unwrap();
        let conflicting = Arc::new(CombiningAlg::new("urn:a", CombinableKind::Rule));
        let err = builder.register(conflicting).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateIdentifier {
                kind: ExtensionKind::CombiningAlgorithm,
                id: "urn:a".to_string(),
            }
        );
        assert!(err.to_string().contains("combining_algorithm"));
    }

    #[test]
    fn merge_policy_selection_table() {
        assert_eq!(MergePolicy::select(false, 0), MergePolicy::ExtensionsOnly);
        assert_eq!(MergePolicy::select(false, 3), MergePolicy::ExtensionsOnly);
        assert_eq!(MergePolicy::select(true, 0), MergePolicy::BuiltinsOnly);
        assert_eq!(MergePolicy::select(true, 1), MergePolicy::Merged);
    }

    #[test]
    fn builtins_only_returns_same_arc() {
        let mut builder = RegistryBuilder::new();
        builder.register(alg("urn:builtin")).unwrap();
        let builtins = Arc::new(builder.build());
        let merged = merge_registry(true, &builtins, &[]).unwrap();
        assert!(Arc::ptr_eq(&merged.registry, &builtins));
    }

    #[test]
    fn fingerprint_depends_on_content_only() {
        let mut first = RegistryBuilder::new();
        first.register_all([alg("urn:b"), alg("urn:a")]).unwrap();
        let mut second = RegistryBuilder::new();
        second.register_all([alg("urn:a"), alg("urn:b")]).unwrap();
        assert_eq!(
            first.build().fingerprint().unwrap(),
            second.build().fingerprint().unwrap()
        );
    }
}
