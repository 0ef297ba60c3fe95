//! Nethercore Replay - deterministic script execution for simulations
//!
//! This crate drives a fixed-tick deterministic simulation through a
//! declarative replay script and produces a structured execution report.
//!
//! # Architecture
//!
//! - [`Simulation`] - Trait implemented by anything the engine can drive
//! - [`DebugRegistry`] - Variables and actions a simulation exposes during init
//! - [`Timeline`] - Validated, normalized script program
//! - [`ReplayEngine`] - Tick-by-tick state machine producing an [`ExecutionReport`]
//! - [`RunnerConfig`] - Runner defaults loaded from `replay.toml`

pub mod config;
pub mod debug;
#[cfg(test)]
mod integration;
pub mod replay;
pub mod simulation;
#[cfg(test)]
pub mod test_utils;

// Re-export core traits and types
pub use config::RunnerConfig;
pub use debug::{DebugAdapter, DebugRegistry, DebugValue, RuntimeError, ValueType};
pub use replay::{
    BatchJob, EngineConfig, EngineState, ExecutionReport, ReplayEngine, ReportStatus,
    ScriptParseError, Timeline, run_batch,
};
pub use simulation::{ReferenceSim, Simulation, SimulationError};
