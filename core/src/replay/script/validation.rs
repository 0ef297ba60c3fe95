//! Replay script validation.
//!
//! Structural checks that need the whole script, run before any input is
//! resolved.

use super::ast::ReplayScript;
use super::parser::{ParseErrorKind, ScriptParseError};
use super::timeline::MAX_PLAYERS;

/// Validate a parsed replay script before compilation.
pub fn validate_script(script: &ReplayScript) -> Result<(), ScriptParseError> {
    if script.console.trim().is_empty() {
        return Err(ScriptParseError::new(
            "console",
            ParseErrorKind::InvalidHeader("console is required".to_string()),
        ));
    }

    if !(1..=MAX_PLAYERS as u8).contains(&script.players) {
        return Err(ScriptParseError::new(
            "players",
            ParseErrorKind::InvalidHeader(format!(
                "player count must be 1-{}, got {}",
                MAX_PLAYERS, script.players
            )),
        ));
    }

    let mut previous: Option<u64> = None;
    for (index, entry) in script.frames.iter().enumerate() {
        if let Some(previous) = previous.filter(|p| entry.f <= *p) {
            return Err(ScriptParseError::at_entry(
                index,
                format!("frames[{}].f", index),
                ParseErrorKind::NonIncreasingTick {
                    tick: entry.f,
                    previous,
                },
            ));
        }
        previous = Some(entry.f);

        for (slot, input) in entry.player_inputs().iter().enumerate() {
            let player = slot as u8 + 1;
            if input.is_some() && player > script.players {
                return Err(ScriptParseError::at_entry(
                    index,
                    format!("frames[{}].p{}", index, player),
                    ParseErrorKind::PlayerOutOfRange {
                        player,
                        players: script.players,
                    },
                ));
            }
        }

        if entry.action_params.is_some() && entry.action.is_none() {
            return Err(ScriptParseError::at_entry(
                index,
                format!("frames[{}].action_params", index),
                ParseErrorKind::OrphanedActionParams,
            ));
        }
    }

    Ok(())
}
