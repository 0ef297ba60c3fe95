//! Errors raised by the debug registry and its adapter

use super::types::{ActionParamKind, ValueType};

/// Rejected registration (raised while the simulation runs its init hook)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("debug names must not be empty")]
    EmptyName,
    #[error("registration after init: {0}")]
    Finalized(String),
    #[error("variable '{0}' is already registered")]
    DuplicateVariable(String),
    #[error("action '{0}' is already registered")]
    DuplicateAction(String),
    #[error("action '{action}' declares parameter '{param}' twice")]
    DuplicateParam { action: String, param: String },
    #[error("action '{action}' parameter '{param}' is {kind} but its default is {default}")]
    DefaultKindMismatch {
        action: String,
        param: String,
        kind: ActionParamKind,
        default: ActionParamKind,
    },
    #[error("action_begin while action '{0}' is still open")]
    ActionPending(String),
    #[error("action parameter or end without action_begin")]
    NoPendingAction,
}

/// Runtime error raised while driving a simulation through the registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("type mismatch for '{name}': {detail}")]
    TypeMismatch { name: String, detail: String },
    #[error("action '{action}' failed: {reason}")]
    ActionInvocation { action: String, reason: String },
    #[error("simulation desync at tick {tick}: {detail}")]
    Desync { tick: u64, detail: String },
}

impl RuntimeError {
    /// Short machine-readable kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::UnknownVariable(_) => "unknown_variable",
            RuntimeError::UnknownAction(_) => "unknown_action",
            RuntimeError::TypeMismatch { .. } => "type_mismatch",
            RuntimeError::ActionInvocation { .. } => "action_invocation",
            RuntimeError::Desync { .. } => "desync",
        }
    }

    /// Desync is the only runtime error that always halts a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::Desync { .. })
    }

    pub(crate) fn value_mismatch(name: &str, declared: ValueType, got: ValueType) -> Self {
        RuntimeError::TypeMismatch {
            name: name.to_string(),
            detail: format!("declared {} but simulation reported {}", declared, got),
        }
    }
}
