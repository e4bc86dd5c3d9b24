// crates/pdp-assembly/src/audit.rs
// ============================================================================
// Module: Assembly Audit Logging
// Description: Structured audit events for PDP assembly stages and outcomes.
// Purpose: Emit JSON-line assembly logs without hard dependencies.
// Dependencies: pdp-config, pdp-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The assembler reports one `pdp_assembly_stage` event per completed
//! pipeline stage and one terminal `pdp_assembly` event per call. Sinks
//! decide where the events go: stderr, an append-only file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use pdp_config::EnvironmentProperties;
use pdp_core::HashDigest;
use pdp_core::MergePolicy;
use serde::Serialize;

use crate::assembler::AssemblyErrorKind;
use crate::assembler::AssemblyState;
use crate::engine::EngineLimits;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Milliseconds since the UNIX epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Completed pipeline stage event.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyStageEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Stage reached.
    pub stage: AssemblyState,
    /// Merge policy applied, for registry stages.
    pub merge_policy: Option<MergePolicy>,
    /// Number of registry entries, for registry stages.
    pub entries: Option<usize>,
    /// Registry content digest, for registry stages.
    pub fingerprint: Option<HashDigest>,
    /// Why the registry digest could not be computed.
    pub fingerprint_error: Option<String>,
    /// Resolved limits, for the limits stage.
    pub limits: Option<EngineLimits>,
    /// Derived properties, for the properties stage.
    pub properties: Option<EnvironmentProperties>,
}

impl AssemblyStageEvent {
    /// Creates an event for `stage` with no stage details.
    #[must_use]
    pub fn new(stage: AssemblyState) -> Self {
        Self {
            event: "pdp_assembly_stage",
            timestamp_ms: now_ms(),
            stage,
            merge_policy: None,
            entries: None,
            fingerprint: None,
            fingerprint_error: None,
            limits: None,
            properties: None,
        }
    }
}

/// Terminal assembly outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyOutcome {
    /// The engine was constructed.
    Constructed,
    /// The registries were resolved without constructing an engine.
    Resolved,
    /// The assembly was rejected.
    Rejected,
}

/// Terminal assembly event.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Configuration source label.
    pub source: String,
    /// Outcome.
    pub outcome: AssemblyOutcome,
    /// Terminal state.
    pub state: AssemblyState,
    /// Last stage completed before a rejection.
    pub failed_after: Option<AssemblyState>,
    /// Error classification on rejection.
    pub error_kind: Option<AssemblyErrorKind>,
    /// Error message on rejection.
    pub message: Option<String>,
}

impl AssemblyAuditEvent {
    /// Creates a success event.
    #[must_use]
    pub fn constructed(source: String) -> Self {
        Self {
            event: "pdp_assembly",
            timestamp_ms: now_ms(),
            source,
            outcome: AssemblyOutcome::Constructed,
            state: AssemblyState::EngineConstructed,
            failed_after: None,
            error_kind: None,
            message: None,
        }
    }

    /// Creates a registry-only success event.
    #[must_use]
    pub fn resolved(source: String) -> Self {
        Self {
            event: "pdp_assembly",
            timestamp_ms: now_ms(),
            source,
            outcome: AssemblyOutcome::Resolved,
            state: AssemblyState::CombiningAlgsResolved,
            failed_after: None,
            error_kind: None,
            message: None,
        }
    }

    /// Creates a rejection event.
    #[must_use]
    pub fn rejected(
        source: String,
        state: AssemblyState,
        failed_after: AssemblyState,
        error_kind: AssemblyErrorKind,
        message: String,
    ) -> Self {
        Self {
            event: "pdp_assembly",
            timestamp_ms: now_ms(),
            source,
            outcome: AssemblyOutcome::Rejected,
            state,
            failed_after: Some(failed_after),
            error_kind: Some(error_kind),
            message: Some(message),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for assembly events.
pub trait AssemblyAuditSink: Send + Sync {
    /// Record a terminal assembly event.
    fn record(&self, event: &AssemblyAuditEvent);

    /// Record a completed stage event.
    fn record_stage(&self, _event: &AssemblyStageEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AssemblyAuditSink for StderrAuditSink {
    fn record(&self, event: &AssemblyAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_stage(&self, event: &AssemblyStageEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized payload line.
    fn write_line<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AssemblyAuditSink for FileAuditSink {
    fn record(&self, event: &AssemblyAuditEvent) {
        self.write_line(event);
    }

    fn record_stage(&self, event: &AssemblyStageEvent) {
        self.write_line(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AssemblyAuditSink for NoopAuditSink {
    fn record(&self, _event: &AssemblyAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
