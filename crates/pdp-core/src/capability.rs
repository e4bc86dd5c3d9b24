// crates/pdp-core/src/capability.rs
// ============================================================================
// Module: Capability Gate
// Description: Optional PDP capabilities and the capability-dependency predicate.
// Purpose: Reject extensions that need a capability the configuration disables.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Some optional PDP capabilities (structured-document path queries) are tied
//! to a dedicated datatype. A function that declares a parameter of that
//! datatype cannot run when the capability is disabled, so the assembler
//! refuses to register it.
//!
//! Only first-order signatures are inspected. The standard higher-order
//! functions take no path-query parameter of their own, and custom
//! higher-order functions cannot be registered as extensions. If custom
//! higher-order extensions are ever admitted, this predicate must be revisited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::catalog::datatypes;
use crate::extension::Extension;

// ============================================================================
// SECTION: Capability
// ============================================================================

/// Optional capability a PDP configuration can enable or disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `XPath` expressions over structured request content.
    XPath,
}

impl Capability {
    /// Returns the identifier of the datatype tied to the capability.
    #[must_use]
    pub const fn datatype_id(self) -> &'static str {
        match self {
            Self::XPath => datatypes::XPATH_EXPRESSION,
        }
    }

    /// Returns the configuration flag that enables the capability.
    #[must_use]
    pub const fn config_flag(self) -> &'static str {
        match self {
            Self::XPath => "enable_xpath",
        }
    }

    /// Returns a stable label for the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Returns true when `extension` depends on `capability`.
///
/// Pure predicate; non-function extensions always return false.
#[must_use]
pub fn is_capability_dependent<T: Extension>(extension: &T, capability: Capability) -> bool {
    extension.requires_capability(capability)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
