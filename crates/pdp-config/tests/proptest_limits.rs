// crates/pdp-config/tests/proptest_limits.rs
// ============================================================================
// Module: Depth Limit Property-Based Tests
// Description: Boundary properties of the numeric limit resolver.
// Purpose: Ensure limits resolve exactly or fail, never clamp.
// ============================================================================

//! Depth limit property-based tests.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use pdp_config::ConfigError;
use pdp_config::PdpConfig;
use pdp_config::UnboundedLimit;
use pdp_config::resolve_limit;
use proptest::prelude::*;

proptest! {
    #[test]
    fn in_range_values_resolve_exactly(value in 0_i32..=i32::MAX) {
        let limit: UnboundedLimit = value.to_string().parse().unwrap();
        let resolved = resolve_limit("max_variable_ref_depth", Some(&limit)).unwrap();
        prop_assert_eq!(resolved.get(), value);
        prop_assert!(!resolved.is_unlimited());
    }

    #[test]
    fn out_of_range_values_fail_with_field(value in (i64::from(i32::MAX) + 1)..=i64::MAX) {
        let limit: UnboundedLimit = value.to_string().parse().unwrap();
        let err = resolve_limit("max_policy_ref_depth", Some(&limit)).unwrap_err();
        prop_assert_eq!(
            err,
            ConfigError::LimitOutOfRange {
                field: "max_policy_ref_depth",
                value: value.to_string(),
            }
        );
    }

    #[test]
    fn huge_decimal_strings_never_resolve(digits in "[1-9][0-9]{10,40}") {
        let limit: UnboundedLimit = digits.parse().unwrap();
        prop_assert!(resolve_limit("max_policy_ref_depth", Some(&limit)).is_err());
    }
}

#[test]
fn toml_integer_and_string_forms_agree() {
    let provider = "[root_policy_provider]\nextension = \"urn:example:policy-provider:static\"\n";
    let integer =
        PdpConfig::from_toml_str(&format!("max_policy_ref_depth = 10\n{provider}")).unwrap();
    let text =
        PdpConfig::from_toml_str(&format!("max_policy_ref_depth = \"10\"\n{provider}")).unwrap();
    assert_eq!(integer.max_policy_ref_depth, text.max_policy_ref_depth);
    let resolved = resolve_limit("max_policy_ref_depth", integer.max_policy_ref_depth.as_ref());
    assert_eq!(resolved.unwrap().get(), 10);
}
