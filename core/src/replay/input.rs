//! Controller input layout and held-input resolution
//!
//! Script input descriptors resolve to one [`ControllerInput`] per player.
//! Between directives, each player's last input is held, the way a physical
//! controller keeps reporting a button until it is released.

use bitcode::{Decode, Encode};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::script::{FrameDirective, MAX_PLAYERS};

/// Controller buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    A = 4,
    B = 5,
    X = 6,
    Y = 7,
    LeftBumper = 8,
    RightBumper = 9,
    LeftStick = 10,
    RightStick = 11,
    Start = 12,
    Select = 13,
}

impl Button {
    /// Every button, in bit order
    pub const ALL: [Button; 14] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftBumper,
        Button::RightBumper,
        Button::LeftStick,
        Button::RightStick,
        Button::Start,
        Button::Select,
    ];

    /// Mask covering every defined button bit
    pub const VALID_MASK: u16 = (1 << 14) - 1;

    /// Get the bitmask for this button
    #[inline]
    pub fn mask(self) -> u16 {
        1 << (self as u8)
    }

    /// Canonical script name
    pub fn name(self) -> &'static str {
        match self {
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::LeftBumper => "lb",
            Button::RightBumper => "rb",
            Button::LeftStick => "l3",
            Button::RightStick => "r3",
            Button::Start => "start",
            Button::Select => "select",
        }
    }

    /// Parse a script button name (case-insensitive, `l`/`r` alias the bumpers)
    pub fn from_name(name: &str) -> Option<Button> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "l" => return Some(Button::LeftBumper),
            "r" => return Some(Button::RightBumper),
            _ => {}
        }
        Button::ALL.into_iter().find(|b| b.name() == lower)
    }
}

/// Canonical per-player input for one tick
///
/// Plain old data so it can be copied byte-for-byte into replay files.
#[repr(C)]
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct ControllerInput {
    /// Button bitmask, bit positions follow [`Button`]
    pub buttons: u16,
    /// Left stick X axis (-127 to 127, mapped to -1.0 to 1.0)
    pub left_stick_x: i8,
    /// Left stick Y axis
    pub left_stick_y: i8,
    /// Right stick X axis
    pub right_stick_x: i8,
    /// Right stick Y axis
    pub right_stick_y: i8,
    /// Left trigger (0 to 255, mapped to 0.0 to 1.0)
    pub left_trigger: u8,
    /// Right trigger
    pub right_trigger: u8,
}

/// Size of one encoded [`ControllerInput`]
pub const INPUT_SIZE: usize = std::mem::size_of::<ControllerInput>();

impl ControllerInput {
    /// The "no buttons held" input
    pub const IDLE: ControllerInput = ControllerInput {
        buttons: 0,
        left_stick_x: 0,
        left_stick_y: 0,
        right_stick_x: 0,
        right_stick_y: 0,
        left_trigger: 0,
        right_trigger: 0,
    };

    /// Digital-only input
    pub fn from_buttons(buttons: u16) -> Self {
        Self {
            buttons,
            ..Self::IDLE
        }
    }

    /// Check if a button is held
    #[inline]
    pub fn held(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    /// Whether any analog axis or trigger is non-neutral
    pub fn has_analog(&self) -> bool {
        self.left_stick_x != 0
            || self.left_stick_y != 0
            || self.right_stick_x != 0
            || self.right_stick_y != 0
            || self.left_trigger != 0
            || self.right_trigger != 0
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }

    /// Held buttons by canonical name, in bit order
    pub fn button_names(&self) -> Vec<&'static str> {
        Button::ALL
            .into_iter()
            .filter(|b| self.held(*b))
            .map(Button::name)
            .collect()
    }

    /// Raw little-endian bytes
    pub fn to_bytes(&self) -> [u8; INPUT_SIZE] {
        let mut bytes = [0u8; INPUT_SIZE];
        bytes.copy_from_slice(bytemuck::bytes_of(self));
        bytes[..2].copy_from_slice(&self.buttons.to_le_bytes());
        bytes
    }

    /// Decode raw bytes, `None` if the length is wrong
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != INPUT_SIZE {
            return None;
        }
        let mut input: ControllerInput = bytemuck::pod_read_unaligned(bytes);
        input.buttons = u16::from_le_bytes([bytes[0], bytes[1]]);
        Some(input)
    }

    /// Short human-readable form used in snapshot reports
    pub fn describe(&self) -> String {
        let names = self.button_names();
        let mut out = if names.is_empty() {
            "idle".to_string()
        } else {
            names.join("+")
        };

        if self.left_stick_x != 0 || self.left_stick_y != 0 {
            out.push_str(&format!(
                " lstick({},{})",
                self.left_stick_x, self.left_stick_y
            ));
        }
        if self.right_stick_x != 0 || self.right_stick_y != 0 {
            out.push_str(&format!(
                " rstick({},{})",
                self.right_stick_x, self.right_stick_y
            ));
        }
        if self.left_trigger != 0 {
            out.push_str(&format!(" lt({})", self.left_trigger));
        }
        if self.right_trigger != 0 {
            out.push_str(&format!(" rt({})", self.right_trigger));
        }
        out
    }
}

/// Quantise a stick axis in [-1, 1]
pub fn quantize_axis(value: f32) -> i8 {
    (value.clamp(-1.0, 1.0) * 127.0).round() as i8
}

/// Quantise a trigger in [0, 1]
pub fn quantize_trigger(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Expand a quantised axis back to [-1, 1]
pub fn axis_to_f32(value: i8) -> f32 {
    (f32::from(value) / 127.0).clamp(-1.0, 1.0)
}

/// Expand a quantised trigger back to [0, 1]
pub fn trigger_to_f32(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Resolves the input every player sees on every tick
///
/// Holds each player's most recent explicit input until a later directive
/// replaces it. Players start idle.
#[derive(Debug, Clone)]
pub struct InputResolver {
    held: Vec<ControllerInput>,
}

impl InputResolver {
    pub fn new(player_count: u8) -> Self {
        let count = usize::from(player_count).clamp(1, MAX_PLAYERS);
        Self {
            held: vec![ControllerInput::IDLE; count],
        }
    }

    /// Resolve inputs for one tick
    ///
    /// `directive` is the directive scheduled at this tick, if any.
    pub fn resolve(&mut self, directive: Option<&FrameDirective>) -> &[ControllerInput] {
        if let Some(directive) = directive {
            for (slot, input) in self.held.iter_mut().zip(directive.inputs.iter()) {
                if let Some(input) = input {
                    *slot = *input;
                }
            }
        }
        &self.held
    }

    /// Summary string for reports: `p1:right+a p2:idle`
    pub fn describe(&self) -> String {
        self.held
            .iter()
            .enumerate()
            .map(|(i, input)| format!("p{}:{}", i + 1, input.describe()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
