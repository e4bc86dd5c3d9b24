// crates/pdp-core/src/lib.rs
// ============================================================================
// Module: PDP Core
// Description: Extension model, registries, and the standard catalogue.
// Purpose: Provide the typed building blocks the PDP assembler merges.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! This crate defines what a PDP extension is (datatype factory, function,
//! combining algorithm), the sealed registries that hold them, and the
//! standard catalogue of built-in entries. Registries are immutable once
//! built and shared through `Arc`; the only way to add entries is through a
//! [`RegistryBuilder`].
//! Invariants:
//! - A registry never holds two different instances under one identifier.
//! - Capability-dependent functions are only present in registries built for
//!   configurations that enable the capability.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capability;
pub mod catalog;
pub mod extension;
pub mod hashing;
pub mod identifiers;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capability::Capability;
pub use capability::is_capability_dependent;
pub use catalog::StandardCatalog;
pub use catalog::datatypes;
pub use extension::CombinableKind;
pub use extension::CombiningAlg;
pub use extension::DatatypeFactory;
pub use extension::Extension;
pub use extension::ExtensionKind;
pub use extension::FirstOrderFunction;
pub use extension::Function;
pub use extension::FunctionFamily;
pub use extension::GenericFunctionFactory;
pub use extension::HigherOrderFunction;
pub use extension::ParameterType;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::hash_canonical_json;
pub use identifiers::CombiningAlgId;
pub use identifiers::DatatypeId;
pub use identifiers::FunctionId;
pub use registry::CombiningAlgRegistry;
pub use registry::DatatypeRegistry;
pub use registry::FunctionRegistry;
pub use registry::FunctionRegistryFingerprint;
pub use registry::MergePolicy;
pub use registry::Merged;
pub use registry::Registration;
pub use registry::Registry;
pub use registry::RegistryBuilder;
pub use registry::RegistryError;
pub use registry::merge_functions;
pub use registry::merge_registry;
