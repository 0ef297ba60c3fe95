//! TOML replay script parser
//!
//! Parses script files into the AST and resolves input descriptors to
//! canonical controller input.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use super::ast::{InputValue, ReplayScript, StructuredInput};
use crate::replay::input::{
    Button, ControllerInput, INPUT_SIZE, quantize_axis, quantize_trigger,
};

/// Where in the script an error was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// 1-based line and column in the source text
    Line { line: usize, column: usize },
    /// 0-based index into the `frames` sequence
    Entry(usize),
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Line { line, column } => write!(f, "line {}, column {}", line, column),
            Position::Entry(index) => write!(f, "frame entry {}", index),
        }
    }
}

/// What went wrong while parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("cannot read script: {0}")]
    Io(String),
    #[error("{0}")]
    Syntax(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("tick {tick} does not come after tick {previous}")]
    NonIncreasingTick { tick: u64, previous: u64 },
    #[error("input for player {player} but the script declares {players} player(s)")]
    PlayerOutOfRange { player: u8, players: u8 },
    #[error("unknown button '{0}'")]
    UnknownButton(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),
    #[error("action_params given without an action")]
    OrphanedActionParams,
}

/// Script rejected before execution
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {kind}{}", position_suffix(.position))]
pub struct ScriptParseError {
    /// Offending field, e.g. `frames[3].p1` or `players`
    pub field: String,
    pub position: Option<Position>,
    pub kind: ParseErrorKind,
}

impl ScriptParseError {
    pub fn new(field: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            field: field.into(),
            position: None,
            kind,
        }
    }

    /// Error inside the `frames` entry at `index`
    pub fn at_entry(index: usize, field: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            field: field.into(),
            position: Some(Position::Entry(index)),
            kind,
        }
    }

    fn from_toml(err: &toml::de::Error, source: &str) -> Self {
        let message = err.message().to_string();
        let field = backticked(&message).unwrap_or("script").to_string();
        let position = err
            .span()
            .and_then(|span| line_column(source, span.start));

        Self {
            field,
            position,
            kind: ParseErrorKind::Syntax(message),
        }
    }
}

fn position_suffix(position: &Option<Position>) -> String {
    position
        .as_ref()
        .map(|position| format!(" ({})", position))
        .unwrap_or_default()
}

/// First `quoted` token in a toml error message
fn backticked(message: &str) -> Option<&str> {
    let start = message.find('`')? + 1;
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

fn line_column(source: &str, offset: usize) -> Option<Position> {
    let before = source.get(..offset)?;
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |l| l.chars().count())
        + 1;
    Some(Position::Line { line, column })
}

impl ReplayScript {
    /// Parse a TOML replay script from a string
    pub fn from_toml(toml_str: &str) -> Result<Self, ScriptParseError> {
        toml::from_str(toml_str).map_err(|e| ScriptParseError::from_toml(&e, toml_str))
    }

    /// Parse a TOML replay script from a file
    pub fn from_file(path: &Path) -> Result<Self, ScriptParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScriptParseError::new(
                path.display().to_string(),
                ParseErrorKind::Io(e.to_string()),
            )
        })?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl InputValue {
    /// Parse symbolic input like "right+a" into a button mask
    pub fn parse_symbolic(s: &str) -> Result<u16, ParseErrorKind> {
        let mut buttons = 0u16;
        for name in s.split('+').map(str::trim) {
            if name.is_empty() || name.eq_ignore_ascii_case("idle") {
                continue;
            }
            let button =
                Button::from_name(name).ok_or_else(|| ParseErrorKind::UnknownButton(name.into()))?;
            buttons |= button.mask();
        }
        Ok(buttons)
    }

    /// Resolve this descriptor to canonical controller input
    pub fn resolve(&self) -> Result<ControllerInput, ParseErrorKind> {
        match self {
            InputValue::Symbolic(s) => Ok(ControllerInput::from_buttons(Self::parse_symbolic(s)?)),
            InputValue::Bitmask(mask) => {
                let buttons = u16::try_from(*mask)
                    .ok()
                    .filter(|m| m & !Button::VALID_MASK == 0)
                    .ok_or_else(|| {
                        ParseErrorKind::InvalidInput(format!(
                            "bitmask {:#x} sets undefined button bits",
                            mask
                        ))
                    })?;
                Ok(ControllerInput::from_buttons(buttons))
            }
            InputValue::HexBytes(bytes) => {
                let input = ControllerInput::from_bytes(bytes).ok_or_else(|| {
                    ParseErrorKind::InvalidInput(format!(
                        "expected {} input bytes, got {}",
                        INPUT_SIZE,
                        bytes.len()
                    ))
                })?;
                if input.buttons & !Button::VALID_MASK != 0 {
                    return Err(ParseErrorKind::InvalidInput(format!(
                        "button bits {:#06x} include undefined buttons",
                        input.buttons
                    )));
                }
                Ok(input)
            }
            InputValue::Structured(s) => s.resolve(),
        }
    }
}

impl StructuredInput {
    fn resolve(&self) -> Result<ControllerInput, ParseErrorKind> {
        let mut buttons = 0u16;
        for name in &self.buttons {
            let button = Button::from_name(name)
                .ok_or_else(|| ParseErrorKind::UnknownButton(name.clone()))?;
            buttons |= button.mask();
        }

        let [lx, ly] = self.lstick.unwrap_or_default();
        let [rx, ry] = self.rstick.unwrap_or_default();

        Ok(ControllerInput {
            buttons,
            left_stick_x: quantize_axis(checked_analog("lstick", lx, -1.0, 1.0)?),
            left_stick_y: quantize_axis(checked_analog("lstick", ly, -1.0, 1.0)?),
            right_stick_x: quantize_axis(checked_analog("rstick", rx, -1.0, 1.0)?),
            right_stick_y: quantize_axis(checked_analog("rstick", ry, -1.0, 1.0)?),
            left_trigger: quantize_trigger(checked_analog("lt", self.lt.unwrap_or(0.0), 0.0, 1.0)?),
            right_trigger: quantize_trigger(checked_analog("rt", self.rt.unwrap_or(0.0), 0.0, 1.0)?),
        })
    }
}

/// Clamp an analog value into range, warning when authoring drift pushed it out
fn checked_analog(name: &str, value: f32, min: f32, max: f32) -> Result<f32, ParseErrorKind> {
    if value.is_nan() {
        return Err(ParseErrorKind::InvalidInput(format!("{} is NaN", name)));
    }
    if value < min || value > max {
        warn!(field = name, value, min, max, "analog value out of range, clamping");
    }
    Ok(value.clamp(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::ActionParamValue;
    use crate::replay::script::FrameEntry;

    #[test]
    fn test_parse_basic_script() {
        let toml_str = r#"
console = "zx"
seed = 12345
players = 1

frames = [
  { f = 0, p1 = "idle", snap = true },
  { f = 1, p1 = "right+a" },
  { f = 60, p1 = "right+a", snap = true, assert = "$player_x > 0" },
]
"#;

        let script = ReplayScript::from_toml(toml_str).unwrap();

        assert_eq!(script.console, "zx");
        assert_eq!(script.seed, 12345);
        assert_eq!(script.players, 1);
        assert_eq!(script.frames.len(), 3);
        assert!(script.frames[0].snap);
        assert!(script.frames[2].assert.is_some());
    }

    #[test]
    fn test_compact_and_expanded_forms_match() {
        let compact = r#"
console = "zx"
seed = 7
players = 2
frames = [
  { f = 0, p1 = "right", p2 = 16, snap = true },
  { f = 4, action = "Load Level", action_params = { level = 2 } },
]
"#;
        let expanded = r#"
console = "zx"
seed = 7
players = 2

[[frames]]
f = 0
p1 = "right"
p2 = 16
snap = true

[[frames]]
f = 4
action = "Load Level"

[frames.action_params]
level = 2
"#;
        assert_eq!(
            ReplayScript::from_toml(compact).unwrap(),
            ReplayScript::from_toml(expanded).unwrap()
        );
    }

    #[test]
    fn test_missing_header_field_names_field() {
        let err = ReplayScript::from_toml("console = \"zx\"\nplayers = 1\n").unwrap_err();
        assert_eq!(err.field, "seed");
        assert!(matches!(err.kind, ParseErrorKind::Syntax(_)));
    }

    #[test]
    fn test_syntax_error_has_line() {
        let err = ReplayScript::from_toml("console = \"zx\"\nseed = 0\nplayers = \n").unwrap_err();
        assert!(matches!(err.position, Some(Position::Line { line: 3, .. })));
    }

    #[test]
    fn test_error_display() {
        let err = ScriptParseError::at_entry(
            1,
            "frames[1].f",
            ParseErrorKind::NonIncreasingTick { tick: 3, previous: 5 },
        );
        assert_eq!(
            err.to_string(),
            "frames[1].f: tick 3 does not come after tick 5 (frame entry 1)"
        );

        let err = ScriptParseError::new("players", ParseErrorKind::InvalidHeader("0".to_string()));
        assert_eq!(err.to_string(), "players: invalid header: 0");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
console = "zx"
seed = 0
players = 1
frames = [{ f = 0, screenshot = true }]
"#;
        let err = ReplayScript::from_toml(toml).unwrap_err();
        assert_eq!(err.field, "screenshot");
    }

    #[test]
    fn test_parse_symbolic_input() {
        assert_eq!(InputValue::parse_symbolic("idle"), Ok(0));
        assert_eq!(InputValue::parse_symbolic("a"), Ok(Button::A.mask()));
        assert_eq!(
            InputValue::parse_symbolic("right+a"),
            Ok(Button::Right.mask() | Button::A.mask())
        );
        assert_eq!(
            InputValue::parse_symbolic("Up + Right + B"),
            Ok(Button::Up.mask() | Button::Right.mask() | Button::B.mask())
        );
        assert_eq!(
            InputValue::parse_symbolic("right+jump"),
            Err(ParseErrorKind::UnknownButton("jump".to_string()))
        );
    }

    #[test]
    fn test_bitmask_input() {
        assert_eq!(
            InputValue::Bitmask(0x18).resolve().unwrap(),
            ControllerInput::from_buttons(0x18)
        );
        assert!(InputValue::Bitmask(0x8000).resolve().is_err());
        assert!(InputValue::Bitmask(-1).resolve().is_err());
    }

    #[test]
    fn test_hex_bytes_input() {
        let input = InputValue::HexBytes(vec![0x18, 0x00, 0x7f, 0x00, 0x00, 0x00, 0xff, 0x00])
            .resolve()
            .unwrap();
        assert_eq!(input.buttons, 0x18);
        assert_eq!(input.left_stick_x, 127);
        assert_eq!(input.left_trigger, 255);

        assert!(InputValue::HexBytes(vec![0x18]).resolve().is_err());
    }

    #[test]
    fn test_structured_input() {
        let toml_str = r#"
console = "zx"
seed = 0
players = 1

[[frames]]
f = 0
[frames.p1]
buttons = ["a"]
lstick = [1.0, 0.0]

[[frames]]
f = 1
[frames.p1]
buttons = []
lstick = [0.5, 0.5]
rt = 0.8
"#;

        let script = ReplayScript::from_toml(toml_str).unwrap();
        assert_eq!(script.frames.len(), 2);

        let first = script.frames[0].p1.as_ref().unwrap().resolve().unwrap();
        assert_eq!(first.buttons, Button::A.mask());
        assert_eq!(first.left_stick_x, 127);

        let second = script.frames[1].p1.as_ref().unwrap().resolve().unwrap();
        assert_eq!(second.buttons, 0);
        assert_eq!(second.left_stick_y, 64);
        assert_eq!(second.right_trigger, 204);
    }

    #[test]
    fn test_structured_input_clamps() {
        let input = InputValue::Structured(StructuredInput {
            lstick: Some([1.02, -1.5]),
            lt: Some(1.2),
            ..Default::default()
        })
        .resolve()
        .unwrap();
        assert_eq!(input.left_stick_x, 127);
        assert_eq!(input.left_stick_y, -127);
        assert_eq!(input.left_trigger, 255);
    }

    #[test]
    fn test_action_parameter_types() {
        let toml = r#"
console = "zx"
seed = 0
players = 1

[[frames]]
f = 0
action = "Configure Game"
action_params = { level = 5, speed = 1.5, enabled = true }
"#;
        let script = ReplayScript::from_toml(toml).unwrap();
        let params = script.frames[0].action_params.as_ref().unwrap();

        assert_eq!(params.get("level"), Some(&ActionParamValue::Int(5)));
        assert_eq!(params.get("speed"), Some(&ActionParamValue::Float(1.5)));
        assert_eq!(params.get("enabled"), Some(&ActionParamValue::Bool(true)));
    }

    #[test]
    fn test_roundtrip() {
        let script = ReplayScript {
            console: "zx".to_string(),
            seed: 42,
            players: 2,
            frames: vec![
                FrameEntry {
                    f: 0,
                    p1: Some(InputValue::Symbolic("idle".to_string())),
                    p2: Some(InputValue::Structured(StructuredInput {
                        buttons: vec!["b".to_string()],
                        rt: Some(0.5),
                        ..Default::default()
                    })),
                    snap: true,
                    ..Default::default()
                },
                FrameEntry {
                    f: 1,
                    p1: Some(InputValue::Symbolic("a".to_string())),
                    assert: Some("$velocity_y < 0".to_string()),
                    action: Some("Load Level".to_string()),
                    action_params: Some(
                        [("level".to_string(), ActionParamValue::Int(2))]
                            .into_iter()
                            .collect(),
                    ),
                    ..Default::default()
                },
            ],
        };

        let toml = script.to_toml().unwrap();
        let parsed = ReplayScript::from_toml(&toml).unwrap();
        assert_eq!(parsed, script);
    }
}
