//! Replay script AST types.
//!
//! These mirror the TOML surface one-to-one. Both the compact inline form
//! (`frames = [{ f = 0, ... }]`) and the expanded block form (`[[frames]]`)
//! deserialize into the same [`FrameEntry`] values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::debug::ActionParamValue;

/// Complete replay script file (TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    /// Console identifier (e.g., "zx")
    pub console: String,

    /// Random seed for deterministic execution
    pub seed: u64,

    /// Number of players (1-4)
    pub players: u8,

    /// Frame entries
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

/// Single frame entry in the script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameEntry {
    /// Tick index
    pub f: u64,

    /// Player 1 input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p1: Option<InputValue>,

    /// Player 2 input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2: Option<InputValue>,

    /// Player 3 input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p3: Option<InputValue>,

    /// Player 4 input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p4: Option<InputValue>,

    /// Capture debug variables before and after update()
    #[serde(default, skip_serializing_if = "is_false")]
    pub snap: bool,

    /// Assertion condition (e.g., "$velocity_y < 0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert: Option<String>,

    /// Debug action to invoke (e.g., "Load Level")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Parameters for the debug action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_params: Option<BTreeMap<String, ActionParamValue>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FrameEntry {
    /// Player inputs as a slice-friendly array (p1 first)
    pub fn player_inputs(&self) -> [Option<&InputValue>; 4] {
        [
            self.p1.as_ref(),
            self.p2.as_ref(),
            self.p3.as_ref(),
            self.p4.as_ref(),
        ]
    }
}

/// Input value - symbolic, integer bitmask, raw bytes or structured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Simple symbolic input: "idle", "a", "right+a"
    Symbolic(String),

    /// Button bitmask: 0x18
    Bitmask(i64),

    /// Raw controller bytes: [0x18, 0x00, 0x7f, 0x00, 0x00, 0x00, 0x00, 0x00]
    HexBytes(Vec<u8>),

    /// Structured input for analog controllers
    Structured(StructuredInput),
}

impl Default for InputValue {
    fn default() -> Self {
        InputValue::Symbolic("idle".to_string())
    }
}

/// Structured input for analog controllers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredInput {
    /// Digital buttons: ["a", "b"]
    #[serde(default)]
    pub buttons: Vec<String>,

    /// Left stick: [x, y] where -1.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstick: Option<[f32; 2]>,

    /// Right stick: [x, y] where -1.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rstick: Option<[f32; 2]>,

    /// Left trigger: 0.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f32>,

    /// Right trigger: 0.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt: Option<f32>,
}
