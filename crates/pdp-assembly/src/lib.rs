// crates/pdp-assembly/src/lib.rs
// ============================================================================
// Module: PDP Assembly
// Description: Configuration assembler and engine construction.
// Purpose: Turn a PDP configuration into a ready engine, or a precise error.
// Dependencies: pdp-config, pdp-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate sequences engine assembly: extension resolution through an
//! [`ExtensionLoader`], the capability gate, registry merges, depth limits,
//! environment properties, and finally the resources opened by a
//! [`ResourceFactory`]. Partial failures close what was opened.
//! Invariants:
//! - Nothing is published on failure; the first failing stage aborts.
//! - A constructed [`PdpEngine`] owns every resource opened for it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assembler;
pub mod audit;
pub mod engine;
pub mod loader;
pub mod resources;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assembler::AssemblyError;
pub use assembler::AssemblyErrorKind;
pub use assembler::AssemblyState;
pub use assembler::PdpAssembler;
pub use audit::AssemblyAuditEvent;
pub use audit::AssemblyAuditSink;
pub use audit::AssemblyOutcome;
pub use audit::AssemblyStageEvent;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use engine::EngineCloseError;
pub use engine::EngineLimits;
pub use engine::EngineResource;
pub use engine::EngineSettings;
pub use engine::PdpEngine;
pub use engine::Registries;
pub use engine::RegistriesFingerprint;
pub use loader::DecisionResultFilter;
pub use loader::ExtensionError;
pub use loader::ExtensionLoader;
pub use loader::StaticExtensionLoader;
pub use resources::ManagedResource;
pub use resources::ResourceError;
pub use resources::ResourceFactory;
pub use resources::ResourceRequest;
pub use resources::ResourceRole;
