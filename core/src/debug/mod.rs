//! Debug inspection system
//!
//! Typed access to the variables and actions a simulation exposes.
//!
//! # Overview
//!
//! During its init hook a simulation registers every value it wants to make
//! inspectable and every action scripts may invoke:
//!
//! ```rust,ignore
//! fn init(&mut self, registry: &mut DebugRegistry) -> Result<(), SimulationError> {
//!     registry.register_variable("player_x", ValueType::Float)?;
//!
//!     registry.action_begin("Load Level")?;
//!     registry.action_param("level", ActionParamValue::Int(1))?;
//!     registry.action_end()?;
//!     Ok(())
//! }
//! ```
//!
//! The replay engine then reads and invokes them through a [`DebugAdapter`],
//! which checks names, declared types and parameter schemas on every call.

pub mod adapter;
pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use adapter::{DebugAdapter, bind_params};
pub use error::{RegistrationError, RuntimeError};
pub use registry::{DebugRegistry, RegisteredAction, RegisteredVariable};
pub use types::{ActionParam, ActionParamKind, ActionParamValue, DebugValue, ValueType};
