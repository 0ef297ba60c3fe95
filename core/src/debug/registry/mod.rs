//! Debug registry
//!
//! Stores the variables and actions a simulation exposes during its init hook.
//! One registry belongs to one simulation instance; nothing here is global.


use hashbrown::HashMap;

use super::error::RegistrationError;
use super::types::{ActionParam, ActionParamValue, ValueType};

/// A registered debug variable
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredVariable {
    /// Stable name (referenced as `$name` in assertions)
    pub name: String,
    /// Declared type
    pub value_type: ValueType,
}

/// A registered debug action with its parameter schema
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAction {
    /// Stable name (e.g., "Load Level")
    pub name: String,
    /// Positional parameters passed to the simulation's handler
    pub params: Vec<ActionParam>,
}

impl RegisteredAction {
    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&ActionParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Builder state for action registration
#[derive(Debug)]
struct PendingAction {
    name: String,
    params: Vec<ActionParam>,
}

/// Registry of debug variables and actions
#[derive(Debug, Default)]
pub struct DebugRegistry {
    /// All registered variables, in registration order
    variables: Vec<RegisteredVariable>,
    /// All registered actions, in registration order
    actions: Vec<RegisteredAction>,
    variable_index: HashMap<String, usize>,
    action_index: HashMap<String, usize>,
    /// Whether registration has been finalized (after init completes)
    finalized: bool,
    /// Pending action being built (between action_begin and action_end)
    pending_action: Option<PendingAction>,
}

impl DebugRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable for inspection
    pub fn register_variable(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<(), RegistrationError> {
        self.check_open(name)?;
        if self.variable_index.contains_key(name) {
            return Err(RegistrationError::DuplicateVariable(name.to_string()));
        }

        self.variable_index
            .insert(name.to_string(), self.variables.len());
        self.variables.push(RegisteredVariable {
            name: name.to_string(),
            value_type,
        });
        Ok(())
    }

    // =========================================================================
    // Action Registration (builder pattern)
    // =========================================================================

    /// Begin building an action
    ///
    /// Call `action_param` to add parameters, then `action_end` to finish.
    pub fn action_begin(&mut self, name: &str) -> Result<(), RegistrationError> {
        self.check_open(name)?;
        if let Some(pending) = &self.pending_action {
            return Err(RegistrationError::ActionPending(pending.name.clone()));
        }

        self.pending_action = Some(PendingAction {
            name: name.to_string(),
            params: Vec::new(),
        });
        Ok(())
    }

    /// Add a parameter to the pending action
    ///
    /// The kind of the parameter is the kind of its default value.
    pub fn action_param(
        &mut self,
        name: &str,
        default_value: ActionParamValue,
    ) -> Result<(), RegistrationError> {
        self.check_open(name)?;
        let Some(pending) = &mut self.pending_action else {
            return Err(RegistrationError::NoPendingAction);
        };

        pending.params.push(ActionParam {
            name: name.to_string(),
            kind: default_value.kind(),
            default_value,
        });
        Ok(())
    }

    /// Finish building the pending action and register it
    pub fn action_end(&mut self) -> Result<(), RegistrationError> {
        if self.finalized {
            return Err(RegistrationError::Finalized("action_end".to_string()));
        }
        let pending = self
            .pending_action
            .take()
            .ok_or(RegistrationError::NoPendingAction)?;

        self.register_action(RegisteredAction {
            name: pending.name,
            params: pending.params,
        })
    }

    /// Register a complete action schema in one call
    pub fn register_action(&mut self, action: RegisteredAction) -> Result<(), RegistrationError> {
        self.check_open(&action.name)?;
        if self.action_index.contains_key(&action.name) {
            return Err(RegistrationError::DuplicateAction(action.name));
        }

        for (i, param) in action.params.iter().enumerate() {
            if param.name.is_empty() {
                return Err(RegistrationError::EmptyName);
            }
            if action.params[..i].iter().any(|p| p.name == param.name) {
                return Err(RegistrationError::DuplicateParam {
                    action: action.name.clone(),
                    param: param.name.clone(),
                });
            }
            if param.default_value.kind() != param.kind {
                return Err(RegistrationError::DefaultKindMismatch {
                    action: action.name.clone(),
                    param: param.name.clone(),
                    kind: param.kind,
                    default: param.default_value.kind(),
                });
            }
        }

        self.action_index
            .insert(action.name.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    fn check_open(&self, name: &str) -> Result<(), RegistrationError> {
        if self.finalized {
            return Err(RegistrationError::Finalized(name.to_string()));
        }
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        Ok(())
    }

    /// Finalize registration (called after init completes)
    ///
    /// Discards any unclosed action and prevents further registration.
    pub fn finalize_registration(&mut self) {
        if let Some(pending) = self.pending_action.take() {
            tracing::warn!(
                "debug: action '{}' left open at end of init, discarding",
                pending.name
            );
        }

        self.finalized = true;

        tracing::info!(
            "Debug registry: {} variables, {} actions",
            self.variables.len(),
            self.actions.len()
        );
    }

    /// Whether init has completed
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&RegisteredVariable> {
        self.variable_index.get(name).map(|&i| &self.variables[i])
    }

    /// Look up an action by name
    pub fn action(&self, name: &str) -> Option<&RegisteredAction> {
        self.action_index.get(name).map(|&i| &self.actions[i])
    }

    /// All variables in registration order
    pub fn variables(&self) -> &[RegisteredVariable] {
        &self.variables
    }

    /// All actions in registration order
    pub fn actions(&self) -> &[RegisteredAction] {
        &self.actions
    }

    /// Get number of registered variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Check if registry is empty (no variables or actions)
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.actions.is_empty()
    }
}
