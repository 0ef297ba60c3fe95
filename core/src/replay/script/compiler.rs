//! Script compiler
//!
//! Normalizes a parsed script into a [`Timeline`]. After this point nothing
//! knows whether a frame was written inline or as a `[[frames]]` block.

use std::path::Path;

use tracing::debug;

use super::ast::ReplayScript;
use super::parser::{ParseErrorKind, ScriptParseError};
use super::timeline::{ActionCall, FrameDirective, ScriptHeader, Timeline};
use super::validation::validate_script;
use crate::replay::assertion::AssertCondition;

impl Timeline {
    /// Validate and normalize a parsed script
    pub fn from_script(script: &ReplayScript) -> Result<Self, ScriptParseError> {
        validate_script(script)?;

        let header = ScriptHeader {
            console: script.console.clone(),
            seed: script.seed,
            players: script.players,
        };

        let mut directives = Vec::with_capacity(script.frames.len());
        for (index, entry) in script.frames.iter().enumerate() {
            let mut directive = FrameDirective::new(entry.f);

            for (slot, value) in entry.player_inputs().into_iter().enumerate() {
                if let Some(value) = value {
                    let input = value.resolve().map_err(|kind| {
                        ScriptParseError::at_entry(index, format!("frames[{}].p{}", index, slot + 1), kind)
                    })?;
                    directive.inputs[slot] = Some(input);
                }
            }

            directive.snap = entry.snap;

            if let Some(condition) = &entry.assert {
                let assertion = AssertCondition::parse(condition).map_err(|reason| {
                    ScriptParseError::at_entry(
                        index,
                        format!("frames[{}].assert", index),
                        ParseErrorKind::InvalidAssertion(reason),
                    )
                })?;
                directive.assertion = Some(assertion);
            }

            if let Some(name) = &entry.action {
                directive.action = Some(ActionCall {
                    name: name.clone(),
                    params: entry.action_params.clone().unwrap_or_default(),
                });
            }

            directives.push(directive);
        }

        let timeline = Timeline::from_parts(header, directives);
        debug!(
            directives = timeline.directives().len(),
            frames = timeline.frame_count(),
            "compiled replay script"
        );
        Ok(timeline)
    }

    /// Parse and normalize a TOML script
    pub fn from_toml(toml_str: &str) -> Result<Self, ScriptParseError> {
        Self::from_script(&ReplayScript::from_toml(toml_str)?)
    }

    /// Parse and normalize a script file
    pub fn from_file(path: &Path) -> Result<Self, ScriptParseError> {
        Self::from_script(&ReplayScript::from_file(path)?)
    }
}
