//! Typed access to a simulation through its debug registry
//!
//! The adapter owns no state. It borrows the simulation and the finalized
//! registry for as long as the engine needs to read a variable or run an
//! action, and checks every name and type against the registered catalog.

use std::collections::BTreeMap;

use super::error::RuntimeError;
use super::registry::{DebugRegistry, RegisteredAction};
use super::types::{ActionParamValue, DebugValue};
use crate::simulation::Simulation;

/// Typed proxy over a simulation's registered variables and actions
pub struct DebugAdapter<'a, S: Simulation + ?Sized> {
    sim: &'a mut S,
    registry: &'a DebugRegistry,
}

impl<'a, S: Simulation + ?Sized> DebugAdapter<'a, S> {
    pub fn new(sim: &'a mut S, registry: &'a DebugRegistry) -> Self {
        Self { sim, registry }
    }

    /// Read one registered variable
    pub fn get_variable(&self, name: &str) -> Result<DebugValue, RuntimeError> {
        let variable = self
            .registry
            .variable(name)
            .ok_or_else(|| RuntimeError::UnknownVariable(name.to_string()))?;

        let value = self
            .sim
            .read_variable(name)
            .ok_or_else(|| RuntimeError::UnknownVariable(name.to_string()))?;

        if value.value_type() != variable.value_type {
            return Err(RuntimeError::value_mismatch(
                name,
                variable.value_type,
                value.value_type(),
            ));
        }
        Ok(value)
    }

    /// Read every registered variable
    ///
    /// Variables that cannot be read are left out of the map; their errors
    /// are returned alongside it.
    pub fn capture_all(&self) -> (BTreeMap<String, DebugValue>, Vec<RuntimeError>) {
        let mut values = BTreeMap::new();
        let mut errors = Vec::new();
        for variable in self.registry.variables() {
            match self.get_variable(&variable.name) {
                Ok(value) => {
                    values.insert(variable.name.clone(), value);
                }
                Err(e) => errors.push(e),
            }
        }
        (values, errors)
    }

    /// Validate named script parameters and invoke a registered action
    pub fn invoke_action(
        &mut self,
        name: &str,
        params: &BTreeMap<String, ActionParamValue>,
    ) -> Result<(), RuntimeError> {
        let action = self
            .registry
            .action(name)
            .ok_or_else(|| RuntimeError::UnknownAction(name.to_string()))?;

        let args = bind_params(action, params)?;

        tracing::debug!(action = name, ?args, "invoking debug action");
        self.sim
            .call_action(name, &args)
            .map_err(|reason| RuntimeError::ActionInvocation {
                action: name.to_string(),
                reason,
            })
    }
}

/// Map named parameters onto the action's positional schema
///
/// Omitted parameters take their declared default. Unknown names and
/// wrong kinds are rejected before the simulation sees the call.
pub fn bind_params(
    action: &RegisteredAction,
    params: &BTreeMap<String, ActionParamValue>,
) -> Result<Vec<ActionParamValue>, RuntimeError> {
    if let Some(unknown) = params.keys().find(|k| action.param(k).is_none()) {
        return Err(RuntimeError::TypeMismatch {
            name: action.name.clone(),
            detail: format!("unknown parameter '{}'", unknown),
        });
    }

    action
        .params
        .iter()
        .map(|param| match params.get(&param.name) {
            None => Ok(param.default_value),
            Some(value) => value.coerce_to(param.kind).ok_or_else(|| {
                RuntimeError::TypeMismatch {
                    name: action.name.clone(),
                    detail: format!(
                        "parameter '{}' expects {}, got {}",
                        param.name,
                        param.kind,
                        value.kind()
                    ),
                }
            }),
        })
        .collect()
}
