// crates/pdp-config/src/lib.rs
// ============================================================================
// Module: PDP Config Library
// Description: Configuration model, depth limits, and source properties.
// Purpose: Single source of truth for pdp.toml semantics.
// Dependencies: bigdecimal, serde, toml, url
// ============================================================================

//! ## Overview
//! `pdp-config` defines the PDP configuration document and everything derived
//! from it before registries are assembled: strict, fail-closed loading, the
//! resolution of unbounded depth limits into bounded integers, and the
//! environment properties derived from where the configuration lives.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod environment;
pub mod limits;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use environment::ConfigSource;
pub use environment::EnvironmentProperties;
pub use environment::EnvironmentPropertyName;
pub use environment::derive_properties;
pub use limits::DepthLimit;
pub use limits::MAX_LIMIT_DIGITS;
pub use limits::UnboundedLimit;
pub use limits::resolve_limit;
