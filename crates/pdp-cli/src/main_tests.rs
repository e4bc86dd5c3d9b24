// crates/pdp-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for catalogue and resolution summaries.
// Purpose: Ensure summaries reflect the registries the assembler resolves.
// Dependencies: pdp-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises summary builders without spawning the binary.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use pdp_config::ConfigSource;
use pdp_config::DepthLimit;
use pdp_config::EnvironmentPropertyName;
use pdp_config::PdpConfig;
use pdp_core::datatypes;

use super::StandardSummary;
use super::build_assembler;
use super::resolve_summary;
use super::standard_catalog;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config(top_level: &str) -> PdpConfig {
    PdpConfig::from_toml_str(&format!(
        "{top_level}\n[root_policy_provider]\nextension = \"urn:example:policy-provider:static\"\n"
    ))
    .unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn standard_summary_selects_xpath_variant() {
    let catalog = standard_catalog().unwrap();
    let plain = StandardSummary::from_catalog(&catalog, false);
    let xpath = StandardSummary::from_catalog(&catalog, true);

    assert!(!plain.datatypes.iter().any(|id| id == datatypes::XPATH_EXPRESSION));
    assert!(xpath.datatypes.iter().any(|id| id == datatypes::XPATH_EXPRESSION));
    assert!(xpath.functions.len() > plain.functions.len());
    assert_eq!(plain.generic_function_factories, xpath.generic_function_factories);
    assert_eq!(plain.combining_algorithms, xpath.combining_algorithms);
}

#[test]
fn resolve_summary_reports_builtins_and_parent_dir() {
    let catalog = standard_catalog().unwrap();
    let assembler = build_assembler(None).unwrap();
    let source = ConfigSource::File(PathBuf::from("/opt/pdp/pdp.toml"));
    let summary = resolve_summary(&assembler, &config("max_policy_ref_depth = 10"), &source).unwrap();

    assert_eq!(summary.counts.datatypes, catalog.datatypes(false).len());
    assert_eq!(summary.counts.combining_algorithms, catalog.combining_algorithms().len());
    assert_eq!(summary.limits.max_policy_ref_depth.get(), 10);
    assert_eq!(summary.limits.max_variable_ref_depth, DepthLimit::UNLIMITED);
    assert_eq!(
        summary.properties.get(EnvironmentPropertyName::ParentDir),
        Some("file:///opt/pdp/")
    );
}

#[test]
fn resolve_summary_fails_on_extension_identifiers() {
    let assembler = build_assembler(None).unwrap();
    let source = ConfigSource::File(PathBuf::from("/opt/pdp/pdp.toml"));
    let err = resolve_summary(
        &assembler,
        &config("datatypes = [\"urn:example:datatype:geo-point\"]"),
        &source,
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "registry resolution failed: no such datatype extension: urn:example:datatype:geo-point"
    );
}
