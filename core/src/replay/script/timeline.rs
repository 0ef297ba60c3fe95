//! Normalized run program
//!
//! A [`Timeline`] is what every later stage consumes. It no longer knows which
//! surface syntax a frame came from, and its directives are strictly ordered.

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};

use crate::debug::ActionParamValue;
use crate::replay::assertion::AssertCondition;
use crate::replay::input::ControllerInput;

/// Maximum number of players a script may declare
pub const MAX_PLAYERS: usize = 4;

/// Run-level metadata
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ScriptHeader {
    /// Console identifier (e.g., "zx")
    pub console: String,
    /// RNG seed handed to the simulation
    pub seed: u64,
    /// Declared player count (1-4)
    pub players: u8,
}

/// Debug action invocation scheduled on a tick
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ActionCall {
    /// Registered action name
    pub name: String,
    /// Named parameters, validated against the schema at invocation time
    pub params: BTreeMap<String, ActionParamValue>,
}

/// One scripted tick's instructions
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FrameDirective {
    /// Tick index
    pub tick: u64,
    /// Explicit per-player inputs; `None` holds the previous input
    pub inputs: [Option<ControllerInput>; MAX_PLAYERS],
    /// Capture pre/post values of every registered variable
    pub snap: bool,
    /// Assertion evaluated against post-tick values
    pub assertion: Option<AssertCondition>,
    /// Action invoked before the tick is simulated
    pub action: Option<ActionCall>,
}

impl FrameDirective {
    /// Empty directive at `tick`
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            inputs: [None; MAX_PLAYERS],
            snap: false,
            assertion: None,
            action: None,
        }
    }
}

/// Ordered run program: header plus directives keyed by increasing tick
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Timeline {
    pub header: ScriptHeader,
    directives: Vec<FrameDirective>,
}

impl Timeline {
    /// Build a timeline from directives that are already known to be ordered.
    ///
    /// Callers outside the script module go through the parser, which
    /// enforces strictly increasing ticks.
    pub(crate) fn from_parts(header: ScriptHeader, directives: Vec<FrameDirective>) -> Self {
        debug_assert!(directives.windows(2).all(|w| w[0].tick < w[1].tick));
        Self { header, directives }
    }

    /// First broken invariant, for timelines that did not come from the parser
    pub(crate) fn invariant_violation(&self) -> Option<String> {
        let players = usize::from(self.header.players);
        if !(1..=MAX_PLAYERS).contains(&players) {
            return Some(format!("player count {} is outside 1..={}", players, MAX_PLAYERS));
        }

        if let Some(pair) = self.directives.windows(2).find(|w| w[0].tick >= w[1].tick) {
            return Some(format!(
                "tick {} does not come after tick {}",
                pair[1].tick, pair[0].tick
            ));
        }

        self.directives.iter().find_map(|directive| {
            directive.inputs[players..]
                .iter()
                .position(Option::is_some)
                .map(|slot| {
                    format!(
                        "tick {} sets input for player {} but the timeline declares {} player(s)",
                        directive.tick,
                        players + slot + 1,
                        players
                    )
                })
        })
    }

    #[cfg(test)]
    pub(crate) fn directives_mut(&mut self) -> &mut Vec<FrameDirective> {
        &mut self.directives
    }

    /// Directives in tick order
    pub fn directives(&self) -> &[FrameDirective] {
        &self.directives
    }

    /// Directive scheduled at `tick`, if any
    pub fn directive_at(&self, tick: u64) -> Option<&FrameDirective> {
        self.directives
            .binary_search_by_key(&tick, |d| d.tick)
            .ok()
            .map(|i| &self.directives[i])
    }

    /// Highest scheduled tick
    pub fn max_tick(&self) -> Option<u64> {
        self.directives.last().map(|d| d.tick)
    }

    /// Number of ticks a run executes: every tick from 0 through the last directive
    pub fn frame_count(&self) -> u64 {
        self.max_tick().map_or(0, |t| t + 1)
    }

    pub fn snap_count(&self) -> usize {
        self.directives.iter().filter(|d| d.snap).count()
    }

    pub fn assertion_count(&self) -> usize {
        self.directives.iter().filter(|d| d.assertion.is_some()).count()
    }

    pub fn action_count(&self) -> usize {
        self.directives.iter().filter(|d| d.action.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ScriptHeader {
        ScriptHeader {
            console: "zx".to_string(),
            seed: 0,
            players: 1,
        }
    }

    #[test]
    fn test_directive_lookup() {
        let timeline = Timeline::from_parts(
            header(),
            vec![
                FrameDirective::new(0),
                FrameDirective::new(5),
                FrameDirective::new(30),
            ],
        );

        assert_eq!(timeline.directive_at(5).map(|d| d.tick), Some(5));
        assert!(timeline.directive_at(6).is_none());
        assert_eq!(timeline.max_tick(), Some(30));
        assert_eq!(timeline.frame_count(), 31);
    }

    #[test]
    fn test_invariant_violation() {
        let mut timeline = Timeline::from_parts(
            header(),
            vec![FrameDirective::new(3), FrameDirective::new(5)],
        );
        assert_eq!(timeline.invariant_violation(), None);

        timeline.directives_mut().swap(0, 1);
        assert_eq!(
            timeline.invariant_violation().as_deref(),
            Some("tick 3 does not come after tick 5")
        );

        timeline.directives_mut().swap(0, 1);
        timeline.directives_mut()[1].inputs[2] = Some(ControllerInput::IDLE);
        assert!(timeline.invariant_violation().unwrap().contains("player 3"));

        timeline.header.players = 0;
        assert!(timeline.invariant_violation().unwrap().contains("player count 0"));
    }

    #[test]
    fn test_empty_timeline_runs_no_ticks() {
        let timeline = Timeline::from_parts(header(), Vec::new());
        assert_eq!(timeline.frame_count(), 0);
        assert!(timeline.directive_at(0).is_none());
    }
}
