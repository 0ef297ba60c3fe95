//! Debug inspection type definitions
//!
//! Core types for the debug variable and action registry.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Declared type of a registered debug variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Bool,
}

impl ValueType {
    /// Get a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Runtime value read from a registered debug variable
///
/// Serialized untagged so reports show plain JSON scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl DebugValue {
    /// Convert to f64 for numeric comparisons
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DebugValue::Int(v) => Some(*v as f64),
            DebugValue::Float(v) => Some(*v),
            DebugValue::Bool(_) => None,
        }
    }

    /// Get the value type for this debug value
    pub fn value_type(&self) -> ValueType {
        match self {
            DebugValue::Int(_) => ValueType::Int,
            DebugValue::Float(_) => ValueType::Float,
            DebugValue::Bool(_) => ValueType::Bool,
        }
    }
}

impl std::fmt::Display for DebugValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebugValue::Int(v) => write!(f, "{}", v),
            DebugValue::Float(v) => write!(f, "{:?}", v),
            DebugValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Declared kind of a debug action parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionParamKind {
    Int,
    Float,
    Bool,
}

impl std::fmt::Display for ActionParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionParamKind::Int => write!(f, "int"),
            ActionParamKind::Float => write!(f, "float"),
            ActionParamKind::Bool => write!(f, "bool"),
        }
    }
}

/// Value for a debug action parameter
///
/// Untagged so script files can write `level = 3` or `speed = 1.5` directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(untagged)]
pub enum ActionParamValue {
    /// Integer parameter
    Int(i64),
    /// Float parameter
    Float(f64),
    /// Boolean parameter
    Bool(bool),
}

impl ActionParamValue {
    /// Kind of this literal
    pub fn kind(&self) -> ActionParamKind {
        match self {
            ActionParamValue::Int(_) => ActionParamKind::Int,
            ActionParamValue::Float(_) => ActionParamKind::Float,
            ActionParamValue::Bool(_) => ActionParamKind::Bool,
        }
    }

    /// Convert this literal to the declared kind.
    ///
    /// Integers widen to floats; every other mismatch is rejected.
    pub fn coerce_to(self, kind: ActionParamKind) -> Option<ActionParamValue> {
        match (self, kind) {
            (ActionParamValue::Int(v), ActionParamKind::Int) => Some(ActionParamValue::Int(v)),
            (ActionParamValue::Int(v), ActionParamKind::Float) => {
                Some(ActionParamValue::Float(v as f64))
            }
            (ActionParamValue::Float(v), ActionParamKind::Float) => {
                Some(ActionParamValue::Float(v))
            }
            (ActionParamValue::Bool(v), ActionParamKind::Bool) => Some(ActionParamValue::Bool(v)),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionParamValue::Int(v) => write!(f, "{}", v),
            ActionParamValue::Float(v) => write!(f, "{:?}", v),
            ActionParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// A typed parameter in an action's schema
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParam {
    /// Parameter name as written in scripts
    pub name: String,
    /// Declared kind
    pub kind: ActionParamKind,
    /// Value used when a script omits the parameter
    pub default_value: ActionParamValue,
}
