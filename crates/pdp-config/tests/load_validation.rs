// crates/pdp-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Tests for file loading limits and schema strictness.
// Purpose: Ensure pdp.toml loading fails closed on invalid inputs.
// ============================================================================

//! Config loading validation tests for pdp-config.

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

use std::fs;
use std::path::Path;

use pdp_config::ConfigError;
use pdp_config::MAX_ATTRIBUTE_PROVIDERS;
use pdp_config::MAX_EXTENSIONS_PER_POINT;
use pdp_config::PdpConfig;
use pdp_config::StandardEnvAttributeSource;
use tempfile::TempDir;

type TestResult = Result<(), String>;

const ROOT_PROVIDER: &str = r#"
[root_policy_provider]
extension = "urn:example:policy-provider:static"
"#;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn assert_invalid(result: Result<PdpConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(err) => {
            let message = err.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message:?} did not contain {needle:?}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn load_full_document() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let content = r#"
enable_xpath = true
use_standard_functions = false
datatypes = ["urn:example:datatype:geo-point"]
functions = ["urn:example:function:geo-within"]
combining_algorithms = ["urn:example:alg:first-permit"]
max_variable_ref_depth = 10
max_policy_ref_depth = "99999999999999999999"
request_filter = "urn:example:request-filter:lax"
result_filter = "urn:example:result-filter:combined"
strict_attribute_issuer_match = true
standard_env_attribute_source = "pdp_only"
bad_request_status_detail_level = 2

[[attribute_providers]]
extension = "urn:example:attribute-provider:ldap"
settings = { url = "ldap://directory.example" }

[root_policy_provider]
extension = "urn:example:policy-provider:directory"
settings = { location = "${PARENT_DIR}policies/" }

[ref_policy_provider]
extension = "urn:example:policy-provider:directory"

[decision_cache]
extension = "urn:example:decision-cache:memory"
settings = { max_entries = 1000 }
"#;
    let path = write_config(&dir, "pdp.toml", content);
    let config = PdpConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    assert!(config.enable_xpath);
    assert!(!config.use_standard_functions);
    assert!(config.use_standard_datatypes);
    assert_eq!(config.functions, vec!["urn:example:function:geo-within".to_string()]);
    assert_eq!(config.attribute_providers.len(), 1);
    assert_eq!(
        config.attribute_providers[0].setting_str("url"),
        Some("ldap://directory.example")
    );
    assert_eq!(config.root_policy_provider.setting_str("location"), Some("${PARENT_DIR}policies/"));
    assert_eq!(config.standard_env_attribute_source, StandardEnvAttributeSource::PdpOnly);
    assert_eq!(config.bad_request_status_detail_level, 2);
    assert_eq!(
        config.max_policy_ref_depth.map(|limit| limit.to_string()),
        Some("99999999999999999999".to_string())
    );
    Ok(())
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = PdpConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let mut content = ROOT_PROVIDER.to_string();
    content.push('#');
    content.push_str(&"x".repeat(1024 * 1024));
    let path = write_config(&dir, "big.toml", &content);
    assert_invalid(PdpConfig::load(Some(&path)), "size limit")
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("binary.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(PdpConfig::load(Some(&path)), "utf-8")
}

#[test]
fn load_rejects_overlong_path() -> TestResult {
    let long = "a".repeat(5000);
    assert_invalid(PdpConfig::load(Some(Path::new(&long))), "max length")
}

// ============================================================================
// SECTION: Schema Strictness
// ============================================================================

#[test]
fn unknown_top_level_key_is_rejected() {
    let content = format!("enable_xpth = true\n{ROOT_PROVIDER}");
    let result = PdpConfig::from_toml_str(&content);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn missing_root_policy_provider_is_rejected() {
    let result = PdpConfig::from_toml_str("enable_xpath = false\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn negative_depth_limit_is_rejected() {
    let content = format!("max_variable_ref_depth = -1\n{ROOT_PROVIDER}");
    assert!(matches!(PdpConfig::from_toml_str(&content), Err(ConfigError::Parse(_))));
}

#[test]
fn exponent_depth_limit_string_is_rejected() {
    let content = format!("max_policy_ref_depth = \"1e10000000\"\n{ROOT_PROVIDER}");
    let result = PdpConfig::from_toml_str(&content);
    assert!(
        matches!(&result, Err(ConfigError::Parse(message)) if message.contains("non-negative integer")),
        "unexpected result: {result:?}"
    );
}

#[test]
fn empty_identifier_is_rejected() -> TestResult {
    let content = format!("datatypes = [\"  \"]\n{ROOT_PROVIDER}");
    assert_invalid(PdpConfig::from_toml_str(&content), "datatypes identifier must be non-empty")
}

#[test]
fn too_many_identifiers_are_rejected() -> TestResult {
    let ids: Vec<String> =
        (0..=MAX_EXTENSIONS_PER_POINT).map(|i| format!("\"urn:example:f:{i}\"")).collect();
    let content = format!("functions = [{}]\n{ROOT_PROVIDER}", ids.join(", "));
    assert_invalid(PdpConfig::from_toml_str(&content), "functions exceeds max entries")
}

#[test]
fn too_many_attribute_providers_are_rejected() -> TestResult {
    let mut content = ROOT_PROVIDER.to_string();
    for i in 0..=MAX_ATTRIBUTE_PROVIDERS {
        content.push_str(&format!(
            "\n[[attribute_providers]]\nextension = \"urn:example:attribute-provider:{i}\"\n"
        ));
    }
    assert_invalid(PdpConfig::from_toml_str(&content), "attribute_providers exceeds max entries")
}

#[test]
fn unknown_extension_config_key_is_rejected() {
    let content = r#"
[root_policy_provider]
extension = "urn:example:policy-provider:static"
setting = { location = "x" }
"#;
    assert!(matches!(PdpConfig::from_toml_str(content), Err(ConfigError::Parse(_))));
}
