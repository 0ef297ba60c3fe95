//! Shared test utilities for integration and unit tests

use std::time::Duration;

use crate::debug::{ActionParamValue, DebugRegistry, DebugValue, ValueType};
use crate::replay::{ControllerInput, Timeline};
use crate::simulation::{Simulation, SimulationError};

// ============================================================================
// Test Simulations
// ============================================================================

/// Counts ticks and optionally misbehaves on one of them
///
/// Exposes `counter` (int) and `armed` (bool), plus an `Arm` action and a
/// `Fail` action that always errors.
#[derive(Debug, Default)]
pub struct TestSim {
    pub counter: i64,
    pub armed: bool,
    pub seed: u64,
    pub updates: Vec<u64>,
    pub inputs: Vec<Vec<ControllerInput>>,
    /// Report a desync from `update` on this tick
    pub desync_at: Option<u64>,
    /// Sleep inside `update` on this tick
    pub stall_at: Option<(u64, Duration)>,
    /// Fail the init hook
    pub fail_init: bool,
}

impl TestSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desync_at(tick: u64) -> Self {
        Self {
            desync_at: Some(tick),
            ..Self::default()
        }
    }

    pub fn stall_at(tick: u64, duration: Duration) -> Self {
        Self {
            stall_at: Some((tick, duration)),
            ..Self::default()
        }
    }
}

impl Simulation for TestSim {
    fn seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    fn init(&mut self, registry: &mut DebugRegistry) -> Result<(), SimulationError> {
        if self.fail_init {
            return Err(SimulationError::Fault("init refused".to_string()));
        }
        registry.register_variable("counter", ValueType::Int)?;
        registry.register_variable("armed", ValueType::Bool)?;

        registry.action_begin("Arm")?;
        registry.action_end()?;

        registry.action_begin("Fail")?;
        registry.action_end()?;
        Ok(())
    }

    fn update(&mut self, tick: u64, inputs: &[ControllerInput]) -> Result<(), SimulationError> {
        if let Some((_, duration)) = self.stall_at.filter(|(at, _)| *at == tick) {
            std::thread::sleep(duration);
        }
        if self.desync_at == Some(tick) {
            return Err(SimulationError::Desync {
                tick,
                detail: "checksum mismatch".to_string(),
            });
        }
        self.updates.push(tick);
        self.inputs.push(inputs.to_vec());
        self.counter += 1;
        Ok(())
    }

    fn read_variable(&self, name: &str) -> Option<DebugValue> {
        match name {
            "counter" => Some(DebugValue::Int(self.counter)),
            "armed" => Some(DebugValue::Bool(self.armed)),
            _ => None,
        }
    }

    fn call_action(&mut self, name: &str, _args: &[ActionParamValue]) -> Result<(), String> {
        match name {
            "Arm" => {
                self.armed = true;
                Ok(())
            }
            _ => Err(format!("{} always fails", name)),
        }
    }
}

// ============================================================================
// Script Helpers
// ============================================================================

/// Build a one-player timeline from inline frame entries
///
/// `frames` is the body of a TOML array, e.g. `{ f = 0, snap = true }`.
pub fn timeline(frames: &str) -> Timeline {
    timeline_with_players(1, frames)
}

pub fn timeline_with_players(players: u8, frames: &str) -> Timeline {
    let source = format!(
        "console = \"zx\"\nseed = 12345\nplayers = {}\nframes = [\n{}\n]\n",
        players, frames
    );
    Timeline::from_toml(&source).expect("test script should compile")
}
