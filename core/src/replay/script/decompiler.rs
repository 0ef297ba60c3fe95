//! Script decompiler
//!
//! Converts a timeline back to TOML script form.

use super::ast::{FrameEntry, InputValue, ReplayScript, StructuredInput};
use super::timeline::Timeline;
use crate::replay::input::{ControllerInput, axis_to_f32, trigger_to_f32};

/// Decompile a timeline to a script
pub fn decompile(timeline: &Timeline) -> ReplayScript {
    let frames = timeline
        .directives()
        .iter()
        .map(|directive| {
            let [p1, p2, p3, p4] = directive.inputs.map(|input| input.map(input_value));
            FrameEntry {
                f: directive.tick,
                p1,
                p2,
                p3,
                p4,
                snap: directive.snap,
                assert: directive.assertion.as_ref().map(|a| a.condition.clone()),
                action: directive.action.as_ref().map(|a| a.name.clone()),
                action_params: directive
                    .action
                    .as_ref()
                    .filter(|a| !a.params.is_empty())
                    .map(|a| a.params.clone()),
            }
        })
        .collect();

    ReplayScript {
        console: timeline.header.console.clone(),
        seed: timeline.header.seed,
        players: timeline.header.players,
        frames,
    }
}

/// Pick the most readable descriptor that still resolves to `input`
fn input_value(input: ControllerInput) -> InputValue {
    // -128 has no exact float form
    let axes = [
        input.left_stick_x,
        input.left_stick_y,
        input.right_stick_x,
        input.right_stick_y,
    ];
    if axes.contains(&i8::MIN) {
        return InputValue::HexBytes(input.to_bytes().to_vec());
    }

    if !input.has_analog() {
        return if input.buttons == 0 {
            InputValue::Symbolic("idle".to_string())
        } else {
            InputValue::Symbolic(input.button_names().join("+"))
        };
    }

    let stick = |x: i8, y: i8| (x != 0 || y != 0).then(|| [axis_to_f32(x), axis_to_f32(y)]);
    let trigger = |t: u8| (t != 0).then(|| trigger_to_f32(t));

    InputValue::Structured(StructuredInput {
        buttons: input.button_names().into_iter().map(String::from).collect(),
        lstick: stick(input.left_stick_x, input.left_stick_y),
        rstick: stick(input.right_stick_x, input.right_stick_y),
        lt: trigger(input.left_trigger),
        rt: trigger(input.right_trigger),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
console = "zx"
seed = 99
players = 2

frames = [
  { f = 0, p1 = "idle", p2 = 0x10, snap = true },
  { f = 2, p1 = { buttons = ["a"], lstick = [0.5, -1.0], rt = 0.8 } },
  { f = 5, p2 = [0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00], assert = "$player_x >= 4" },
  { f = 9, action = "Teleport", action_params = { x = 10, y = -2.5 } },
]
"#;

    #[test]
    fn test_decompile_preserves_directives() {
        let timeline = Timeline::from_toml(SCRIPT).unwrap();
        let script = decompile(&timeline);

        assert_eq!(script.console, "zx");
        assert_eq!(script.seed, 99);
        assert_eq!(script.frames.len(), 4);
        assert_eq!(
            script.frames[0].p1,
            Some(InputValue::Symbolic("idle".to_string()))
        );
        assert_eq!(
            script.frames[0].p2,
            Some(InputValue::Symbolic("a".to_string()))
        );
        assert!(matches!(script.frames[1].p1, Some(InputValue::Structured(_))));
        assert!(script.frames[1].p2.is_none());
        assert!(matches!(script.frames[2].p2, Some(InputValue::HexBytes(_))));
        assert_eq!(script.frames[3].action.as_deref(), Some("Teleport"));
    }

    #[test]
    fn test_decompile_recompiles_to_same_timeline() {
        let timeline = Timeline::from_toml(SCRIPT).unwrap();
        let text = decompile(&timeline).to_toml().unwrap();
        assert_eq!(Timeline::from_toml(&text).unwrap(), timeline);
    }
}
