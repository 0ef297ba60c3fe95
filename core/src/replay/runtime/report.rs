//! Execution report types and serialization
//!
//! Field order and map types are fixed so that two runs of the same script
//! serialize to the same bytes once the timing fields are removed.

use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::debug::{RegisteredVariable, RuntimeError, ValueType};
use crate::replay::script::ScriptHeader;
use crate::replay::types::{AssertionResult, ReportedError, Snapshot};

/// Report format version
pub const REPORT_VERSION: &str = "1.0";

/// Execution report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Report format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Script file name (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Execution timestamp (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    /// Execution duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Console name
    pub console: String,
    /// Random seed used
    pub seed: u64,
    /// Frames executed
    pub frames_executed: u64,
    /// Variables the simulation registered during init
    pub registered_variables: Vec<DebugVariableInfo>,
    /// Captured snapshots
    pub snapshots: Vec<Snapshot>,
    /// Assertion results
    pub assertions: Vec<AssertionResult>,
    /// Runtime errors recorded during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReportedError>,
    /// Summary statistics
    pub summary: ReportSummary,
}

fn default_version() -> String {
    REPORT_VERSION.to_string()
}

/// Debug variable metadata for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugVariableInfo {
    /// Variable name (e.g., "player_x")
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// Overall run outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportStatus {
    Passed,
    Failed,
    Timeout,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Passed => write!(f, "PASSED"),
            ReportStatus::Failed => write!(f, "FAILED"),
            ReportStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// Report summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of frames with snapshots
    pub frames_with_snap: usize,
    /// Number of passed assertions
    pub assertions_passed: usize,
    /// Number of failed assertions
    pub assertions_failed: usize,
    /// Ticks actually executed
    pub total_frames: u64,
    /// Overall status
    pub status: ReportStatus,
}

impl ExecutionReport {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize without timing fields, byte-identical across reruns
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        let mut canonical = self.clone();
        canonical.executed_at = None;
        canonical.duration_ms = None;
        canonical.to_json()
    }

    pub fn status(&self) -> ReportStatus {
        self.summary.status
    }

    /// Failed assertions in execution order
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

/// How a run ended, as far as the report is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every scheduled tick ran
    Completed,
    /// Stopped early by fail-fast or a fatal error
    Aborted,
    /// Wall-clock timeout fired
    TimedOut,
}

/// Accumulates snapshots, assertion results and errors during a run
#[derive(Debug)]
pub struct ReportBuilder {
    script: Option<String>,
    console: String,
    seed: u64,
    variables: Vec<DebugVariableInfo>,
    snapshots: Vec<Snapshot>,
    assertions: Vec<AssertionResult>,
    errors: Vec<ReportedError>,
    executed_at: String,
    started: Instant,
}

impl ReportBuilder {
    pub fn new(header: &ScriptHeader, script: Option<String>) -> Self {
        Self {
            script,
            console: header.console.clone(),
            seed: header.seed,
            variables: Vec::new(),
            snapshots: Vec::new(),
            assertions: Vec::new(),
            errors: Vec::new(),
            executed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            started: Instant::now(),
        }
    }

    /// Record the variable catalog, once, after init
    pub fn set_variables(&mut self, variables: &[RegisteredVariable]) {
        self.variables = variables
            .iter()
            .map(|v| DebugVariableInfo {
                name: v.name.clone(),
                value_type: v.value_type,
            })
            .collect();
    }

    pub fn add_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn add_assertion(&mut self, result: AssertionResult) {
        self.assertions.push(result);
    }

    pub fn add_error(&mut self, frame: u64, kind: &str, message: String) {
        self.errors.push(ReportedError {
            frame,
            kind: kind.to_string(),
            message,
        });
    }

    pub fn add_runtime_error(&mut self, frame: u64, error: &RuntimeError) {
        self.add_error(frame, error.kind(), error.to_string());
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn assertions(&self) -> &[AssertionResult] {
        &self.assertions
    }

    pub fn errors(&self) -> &[ReportedError] {
        &self.errors
    }

    /// Finish the report
    pub fn build(self, frames_executed: u64, outcome: RunOutcome) -> ExecutionReport {
        let passed = self.assertions.iter().filter(|r| r.passed).count();
        let failed = self.assertions.len() - passed;

        let status = match outcome {
            RunOutcome::TimedOut => ReportStatus::Timeout,
            RunOutcome::Aborted => ReportStatus::Failed,
            RunOutcome::Completed if failed > 0 => ReportStatus::Failed,
            RunOutcome::Completed => ReportStatus::Passed,
        };

        ExecutionReport {
            version: REPORT_VERSION.to_string(),
            script: self.script,
            executed_at: Some(self.executed_at),
            duration_ms: Some(self.started.elapsed().as_millis() as u64),
            console: self.console,
            seed: self.seed,
            frames_executed,
            registered_variables: self.variables,
            summary: ReportSummary {
                frames_with_snap: self.snapshots.len(),
                assertions_passed: passed,
                assertions_failed: failed,
                total_frames: frames_executed,
                status,
            },
            snapshots: self.snapshots,
            assertions: self.assertions,
            errors: self.errors,
        }
    }
}
