//! Nethercore Replay System
//!
//! Deterministic script execution for testing and debugging:
//!
//! - **Script format (`.ncrs`)** - Human-readable TOML describing per-tick
//!   inputs, snapshots, debug actions and assertions
//! - **Binary format (`.ncrp`)** - Compact storage for compiled scripts
//!
//! # Architecture
//!
//! ```text
//! .ncrs (TOML) -> parser -> Timeline -> ReplayEngine -> report.json
//!                                          |
//!                          InputResolver: held per-player inputs
//!                          DebugAdapter: snap / action / assert
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use nethercore_replay::replay::{EngineConfig, ReplayEngine, Timeline};
//! use nethercore_replay::simulation::ReferenceSim;
//!
//! let timeline = Timeline::from_file("jump.ncrs")?;
//! let report = ReplayEngine::new(ReferenceSim::new(), timeline, EngineConfig::default()).run();
//! println!("{}", report.to_json()?);
//! ```

pub mod assertion;
pub mod binary;
pub mod input;
pub mod runtime;
pub mod script;
pub mod types;

// Re-export core types
pub use assertion::{AssertCondition, AssertLiteral, CompareOp, Evaluation};
pub use input::{Button, ControllerInput, INPUT_SIZE, InputResolver};
pub use types::{
    AssertionResult, DeltaValue, InputSequence, Replay, ReplayFlags, ReplayHeader, ReportedError,
    Snapshot,
};

// Re-export binary format
pub use binary::{
    BinaryFormatError, BinaryReader, BinaryWriter, MAX_FRAMES, read_timeline, write_timeline,
};

// Re-export script format
pub use script::{
    FrameDirective, FrameEntry, InputValue, ParseErrorKind, ReplayScript, ScriptHeader,
    ScriptParseError, StructuredInput, Timeline, decompile, validate_script,
};

// Re-export runtime
pub use runtime::{
    BatchJob, EngineConfig, EngineState, ExecutionReport, ReplayEngine, ReportStatus, run_batch,
};
