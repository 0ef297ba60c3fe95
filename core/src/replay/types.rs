//! Core types for the replay system
//!
//! This module defines the data structures shared by the binary (.ncrp)
//! format, the execution engine and the report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::debug::DebugValue;
use crate::replay::input::{ControllerInput, INPUT_SIZE};
use crate::replay::script::Timeline;

/// Complete replay data (in-memory representation)
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub header: ReplayHeader,
    pub inputs: InputSequence,
    /// Sparse directives, present when the file carries a directive section
    pub timeline: Option<Timeline>,
}

impl Default for Replay {
    fn default() -> Self {
        Self {
            header: ReplayHeader::default(),
            inputs: InputSequence::new(),
            timeline: None,
        }
    }
}

/// Lean header - no ROM identification (replays survive code changes and renames)
/// Extensibility via flags and reserved bytes (no version field needed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayHeader {
    /// Console identifier (e.g., 1 for ZX)
    pub console_id: u8,
    /// Number of players
    pub player_count: u8,
    /// Bytes per player per frame
    pub input_size: u8,
    /// Feature flags
    pub flags: ReplayFlags,
    /// Reserved for future use
    pub reserved: [u8; 4],
    /// Random seed for deterministic execution
    pub seed: u64,
    /// Total number of frames
    pub frame_count: u64,
}

impl Default for ReplayHeader {
    fn default() -> Self {
        Self {
            console_id: 1, // ZX
            player_count: 1,
            input_size: INPUT_SIZE as u8,
            flags: ReplayFlags::empty(),
            reserved: [0u8; 4],
            seed: 0,
            frame_count: 0,
        }
    }
}

bitflags::bitflags! {
    /// Replay feature flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReplayFlags: u8 {
        /// Input stream is delta + LZ4 compressed
        const COMPRESSED_INPUTS = 0b0000_0010;
        /// File ends with the sparse directive section
        const HAS_DIRECTIVES = 0b0000_1000;
    }
}

// Manual serde implementation for ReplayFlags
impl Serialize for ReplayFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ReplayFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(ReplayFlags::from_bits_truncate(bits))
    }
}

/// Console id stored in the binary header
pub fn console_id(console: &str) -> u8 {
    match console {
        "zx" => 1,
        _ => 0,
    }
}

/// Console name for a binary header id
pub fn console_name(id: u8) -> String {
    match id {
        1 => "zx".to_string(),
        _ => format!("console_{}", id),
    }
}

/// Sequence of inputs, indexed by frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSequence {
    /// frames[frame_idx][player_idx] = input
    frames: Vec<Vec<ControllerInput>>,
}

impl InputSequence {
    /// Create a new empty input sequence
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Add a frame of inputs for all players
    pub fn push_frame(&mut self, player_inputs: Vec<ControllerInput>) {
        self.frames.push(player_inputs);
    }

    /// Get inputs for a specific frame
    pub fn get_frame(&self, frame: u64) -> Option<&[ControllerInput]> {
        self.frames.get(frame as usize).map(Vec::as_slice)
    }

    /// Get the total number of frames
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Iterate over all frames
    pub fn iter(&self) -> impl Iterator<Item = &[ControllerInput]> {
        self.frames.iter().map(Vec::as_slice)
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Per-variable change across one snapped tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaValue {
    Int(i64),
    Float(f64),
    /// `"false -> true"`
    Transition(String),
}

impl DeltaValue {
    /// Delta between two captures, `None` when the value did not change
    pub fn between(pre: &DebugValue, post: &DebugValue) -> Option<Self> {
        match (pre, post) {
            (DebugValue::Int(a), DebugValue::Int(b)) => {
                (a != b).then(|| DeltaValue::Int(b.wrapping_sub(*a)))
            }
            (DebugValue::Float(a), DebugValue::Float(b)) => {
                (a.to_bits() != b.to_bits()).then(|| DeltaValue::Float(b - a))
            }
            _ => (pre != post).then(|| DeltaValue::Transition(format!("{} -> {}", pre, post))),
        }
    }
}

/// Snapshot captured during execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frame number
    pub frame: u64,
    /// Input applied this frame
    pub input: String,
    /// Variables before update()
    pub pre: BTreeMap<String, DebugValue>,
    /// Variables after update()
    pub post: BTreeMap<String, DebugValue>,
    /// Computed delta (only changed values)
    pub delta: BTreeMap<String, DeltaValue>,
}

impl Snapshot {
    pub fn new(
        frame: u64,
        input: String,
        pre: BTreeMap<String, DebugValue>,
        post: BTreeMap<String, DebugValue>,
    ) -> Self {
        let delta = post
            .iter()
            .filter_map(|(name, after)| {
                let before = pre.get(name)?;
                DeltaValue::between(before, after).map(|d| (name.clone(), d))
            })
            .collect();

        Self {
            frame,
            input,
            pre,
            post,
            delta,
        }
    }
}

/// Assertion result from execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Frame number
    pub frame: u64,
    /// Condition string
    pub condition: String,
    /// Comparison operator
    pub comparator: String,
    /// Whether the assertion passed
    pub passed: bool,
    /// Actual value observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<DebugValue>,
    /// Expected value (for failed assertions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Why the assertion could not be evaluated normally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runtime error captured into the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    pub frame: u64,
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_sequence() {
        let a = ControllerInput::from_buttons(0x0F);
        let b = ControllerInput::from_buttons(0xF0);
        let mut inputs = InputSequence::new();
        inputs.push_frame(vec![a, b]);
        inputs.push_frame(vec![b, a]);

        assert_eq!(inputs.frame_count(), 2);
        assert_eq!(inputs.get_frame(0), Some(&[a, b][..]));
        assert_eq!(inputs.get_frame(1), Some(&[b, a][..]));
        assert_eq!(inputs.get_frame(2), None);
    }

    #[test]
    fn test_replay_flags() {
        let flags = ReplayFlags::HAS_DIRECTIVES | ReplayFlags::COMPRESSED_INPUTS;
        assert!(flags.contains(ReplayFlags::HAS_DIRECTIVES));
        assert!(flags.contains(ReplayFlags::COMPRESSED_INPUTS));
        assert_eq!(flags.bits(), 0b1010);
    }

    #[test]
    fn test_console_ids() {
        assert_eq!(console_id("zx"), 1);
        assert_eq!(console_name(1), "zx");
        assert_eq!(console_name(console_id("other")), "console_0");
    }

    #[test]
    fn test_delta_only_changed_values() {
        let pre: BTreeMap<_, _> = [
            ("x".to_string(), DebugValue::Float(1.0)),
            ("level".to_string(), DebugValue::Int(1)),
            ("on_ground".to_string(), DebugValue::Bool(true)),
            ("score".to_string(), DebugValue::Int(4)),
        ]
        .into_iter()
        .collect();
        let post: BTreeMap<_, _> = [
            ("x".to_string(), DebugValue::Float(3.5)),
            ("level".to_string(), DebugValue::Int(3)),
            ("on_ground".to_string(), DebugValue::Bool(false)),
            ("score".to_string(), DebugValue::Int(4)),
        ]
        .into_iter()
        .collect();

        let snapshot = Snapshot::new(1, "p1:a".to_string(), pre, post);
        assert_eq!(snapshot.delta.get("x"), Some(&DeltaValue::Float(2.5)));
        assert_eq!(snapshot.delta.get("level"), Some(&DeltaValue::Int(2)));
        assert_eq!(
            snapshot.delta.get("on_ground"),
            Some(&DeltaValue::Transition("true -> false".to_string()))
        );
        assert!(!snapshot.delta.contains_key("score"));
    }

    #[test]
    fn test_delta_serializes_as_scalars() {
        let json = serde_json::to_string(&DeltaValue::Float(-8.0)).unwrap();
        assert_eq!(json, "-8.0");
        let json = serde_json::to_string(&DeltaValue::Transition("a -> b".into())).unwrap();
        assert_eq!(json, "\"a -> b\"");
    }
}
