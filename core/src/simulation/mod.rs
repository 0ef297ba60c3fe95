//! Simulation boundary
//!
//! The replay engine never simulates game logic itself. It drives any type
//! implementing [`Simulation`]: a fixed-tick deterministic instance that
//! registers its inspectable variables and invocable actions during `init`.

mod reference;

pub use reference::ReferenceSim;

use crate::debug::{ActionParamValue, DebugRegistry, DebugValue, RegistrationError};
use crate::replay::ControllerInput;

/// Errors reported by a simulation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// The simulation detected that its state diverged and cannot be trusted
    #[error("desync at tick {tick}: {detail}")]
    Desync { tick: u64, detail: String },
    /// Any other failure inside a simulation hook
    #[error("simulation fault: {0}")]
    Fault(String),
    /// Debug registration was rejected during init
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// A deterministic fixed-tick simulation
///
/// State at tick T+1 must be a pure function of the state at T, the seed and
/// the inputs passed to `update`.
pub trait Simulation {
    /// Seed the simulation's RNG. Called once, before `init`.
    fn seed(&mut self, seed: u64);

    /// Init hook: register every inspectable variable and invocable action.
    fn init(&mut self, registry: &mut DebugRegistry) -> Result<(), SimulationError>;

    /// Advance exactly one tick with one input per player.
    fn update(&mut self, tick: u64, inputs: &[ControllerInput]) -> Result<(), SimulationError>;

    /// Read the current value of a registered variable.
    fn read_variable(&self, name: &str) -> Option<DebugValue>;

    /// Run a registered action. `args` follow the registered parameter order.
    fn call_action(&mut self, name: &str, args: &[ActionParamValue]) -> Result<(), String>;
}

impl<S: Simulation + ?Sized> Simulation for Box<S> {
    fn seed(&mut self, seed: u64) {
        (**self).seed(seed)
    }

    fn init(&mut self, registry: &mut DebugRegistry) -> Result<(), SimulationError> {
        (**self).init(registry)
    }

    fn update(&mut self, tick: u64, inputs: &[ControllerInput]) -> Result<(), SimulationError> {
        (**self).update(tick, inputs)
    }

    fn read_variable(&self, name: &str) -> Option<DebugValue> {
        (**self).read_variable(name)
    }

    fn call_action(&mut self, name: &str, args: &[ActionParamValue]) -> Result<(), String> {
        (**self).call_action(name, args)
    }
}
