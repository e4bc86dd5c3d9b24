// crates/pdp-cli/src/main.rs
// ============================================================================
// Module: PDP CLI Entry Point
// Description: Command dispatcher for configuration checks and registry dumps.
// Purpose: Inspect what a PDP configuration assembles to without serving it.
// Dependencies: clap, pdp-assembly, pdp-config, pdp-core, serde, thiserror
// ============================================================================

//! ## Overview
//! The `pdp` binary validates configuration files, prints the standard
//! extension catalogue, and resolves a configuration's registries, limits,
//! and environment properties. It links no extension implementations, so
//! configurations that name extension identifiers fail registry resolution
//! with the same error an embedding application would see for an unknown id.
//! Resources are never opened.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use pdp_assembly::EngineLimits;
use pdp_assembly::FileAuditSink;
use pdp_assembly::ManagedResource;
use pdp_assembly::PdpAssembler;
use pdp_assembly::Registries;
use pdp_assembly::RegistriesFingerprint;
use pdp_assembly::ResourceError;
use pdp_assembly::ResourceFactory;
use pdp_assembly::ResourceRequest;
use pdp_assembly::StaticExtensionLoader;
use pdp_config::ConfigSource;
use pdp_config::EnvironmentProperties;
use pdp_config::PdpConfig;
use pdp_config::derive_properties;
use pdp_config::resolve_path;
use pdp_core::StandardCatalog;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pdp", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the standard extension catalogue as JSON.
    Standard(StandardCommand),
    /// Resolve a configuration's registries and print a JSON summary.
    Registries(RegistriesCommand),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to pdp.toml or `PDP_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the standard catalogue dump.
#[derive(Args, Debug)]
struct StandardCommand {
    /// Include the `XPath`-dependent datatype and functions.
    #[arg(long)]
    xpath: bool,
}

/// Arguments for registry resolution.
#[derive(Args, Debug)]
struct RegistriesCommand {
    /// Optional config file path (defaults to pdp.toml or `PDP_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Append assembly audit events to this JSON-lines file.
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Identifiers of the standard catalogue.
#[derive(Debug, Serialize)]
struct StandardSummary {
    /// Whether the `XPath` variants were selected.
    xpath: bool,
    /// Datatype identifiers.
    datatypes: Vec<String>,
    /// Non-generic function identifiers.
    functions: Vec<String>,
    /// Generic function factory identifiers.
    generic_function_factories: Vec<String>,
    /// Combining algorithm identifiers.
    combining_algorithms: Vec<String>,
}

impl StandardSummary {
    /// Collects identifiers from the catalogue variant selected by `xpath`.
    fn from_catalog(catalog: &StandardCatalog, xpath: bool) -> Self {
        let functions = catalog.functions(xpath);
        Self {
            xpath,
            datatypes: catalog.datatypes(xpath).ids().map(str::to_string).collect(),
            functions: functions.non_generic().ids().map(str::to_string).collect(),
            generic_function_factories: functions
                .generic_factories()
                .ids()
                .map(str::to_string)
                .collect(),
            combining_algorithms: catalog
                .combining_algorithms()
                .ids()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Entry counts of resolved registries.
#[derive(Debug, Serialize)]
struct RegistryCounts {
    /// Datatype count.
    datatypes: usize,
    /// Non-generic function count.
    functions: usize,
    /// Generic function factory count.
    generic_function_factories: usize,
    /// Combining algorithm count.
    combining_algorithms: usize,
}

impl From<&Registries> for RegistryCounts {
    fn from(registries: &Registries) -> Self {
        Self {
            datatypes: registries.datatypes.len(),
            functions: registries.functions.non_generic().len(),
            generic_function_factories: registries.functions.generic_factories().len(),
            combining_algorithms: registries.combining_algorithms.len(),
        }
    }
}

/// Resolution summary of one configuration.
#[derive(Debug, Serialize)]
struct ResolvedSummary {
    /// Configuration source.
    source: String,
    /// Entry counts.
    counts: RegistryCounts,
    /// Registry content digests.
    fingerprint: RegistriesFingerprint,
    /// Resolved depth limits.
    limits: EngineLimits,
    /// Derived environment properties.
    properties: EnvironmentProperties,
}

// ============================================================================
// SECTION: Resource Stub
// ============================================================================

/// Resource factory that supports no extension.
///
/// Registry resolution never reaches it; it exists to satisfy the assembler.
struct NoResources;

impl ResourceFactory for NoResources {
    fn open(
        &self,
        request: &ResourceRequest<'_>,
    ) -> Result<Box<dyn ManagedResource>, ResourceError> {
        Err(ResourceError::Unsupported {
            role: request.role,
            extension: request.config.extension.clone(),
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
        Commands::Standard(command) => command_standard(&command),
        Commands::Registries(command) => command_registries(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let path = resolve_path(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let config = PdpConfig::load_file(&path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    PdpAssembler::resolve_limits(&config)
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    write_stdout_line(&format!("config valid: {}", path.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the standard catalogue dump.
fn command_standard(command: &StandardCommand) -> CliResult<ExitCode> {
    let catalog = standard_catalog()?;
    write_json(&StandardSummary::from_catalog(&catalog, command.xpath))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes registry resolution for one configuration.
fn command_registries(command: &RegistriesCommand) -> CliResult<ExitCode> {
    let path = resolve_path(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let config = PdpConfig::load_file(&path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let assembler = build_assembler(command.audit_log.as_deref())?;
    let summary = resolve_summary(&assembler, &config, &ConfigSource::File(path))?;
    write_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the standard catalogue.
fn standard_catalog() -> CliResult<Arc<StandardCatalog>> {
    StandardCatalog::new()
        .map(Arc::new)
        .map_err(|err| CliError::new(format!("standard catalogue invalid: {err}")))
}

/// Builds an assembler with no extensions and an optional audit log.
fn build_assembler(audit_log: Option<&Path>) -> CliResult<PdpAssembler> {
    let assembler = PdpAssembler::new(
        standard_catalog()?,
        Arc::new(StaticExtensionLoader::new()),
        Arc::new(NoResources),
    );
    match audit_log {
        Some(path) => {
            let sink = FileAuditSink::new(path).map_err(|err| {
                CliError::new(format!("audit log {} unavailable: {err}", path.display()))
            })?;
            Ok(assembler.with_audit_sink(Arc::new(sink)))
        }
        None => Ok(assembler),
    }
}

/// Resolves registries, limits, and properties for `config`.
fn resolve_summary(
    assembler: &PdpAssembler,
    config: &PdpConfig,
    source: &ConfigSource,
) -> CliResult<ResolvedSummary> {
    let registries = assembler
        .resolve_registries(config, source)
        .map_err(|err| CliError::new(format!("registry resolution failed: {err}")))?;
    let limits = PdpAssembler::resolve_limits(config)
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    let properties = derive_properties(source)
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    let fingerprint = registries
        .fingerprint()
        .map_err(|err| CliError::new(format!("registry fingerprint failed: {err}")))?;
    Ok(ResolvedSummary {
        source: source.to_string(),
        counts: RegistryCounts::from(&registries),
        fingerprint,
        limits,
        properties,
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("output serialization failed: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
