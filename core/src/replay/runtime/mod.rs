//! Replay runtime
//!
//! Execution infrastructure for compiled timelines:
//! - **Engine**: steps a simulation tick by tick with snapshot/assertion support
//! - **Report**: accumulates results into a deterministic report
//! - **Batch**: runs independent scripts on isolated simulation instances

mod batch;
mod engine;
mod report;

pub use batch::{BatchJob, run_batch};
pub use engine::{DEFAULT_TIMEOUT, EngineConfig, EngineState, ReplayEngine};
pub use report::{
    DebugVariableInfo, ExecutionReport, REPORT_VERSION, ReportBuilder, ReportStatus, ReportSummary,
    RunOutcome,
};
