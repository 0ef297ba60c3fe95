//! Binary replay format (.ncrp)
//!
//! The binary format is optimized for compact storage and fast loading.
//! Inputs are stored densely (held inputs already applied) with optional
//! delta + LZ4 compression. A trailing directive section keeps the sparse
//! timeline so that a compiled script decompiles back losslessly.
//!
//! # File Structure
//!
//! ```text
//! +------------------------------------------------+
//! | Header (24 bytes)                              |
//! |  - console_id: u8                              |
//! |  - player_count: u8                            |
//! |  - input_size: u8                              |
//! |  - flags: u8                                   |
//! |  - reserved: [u8; 4]                           |
//! |  - seed: u64                                   |
//! |  - frame_count: u64                            |
//! +------------------------------------------------+
//! | Input Stream (delta-compressed if flagged)     |
//! +------------------------------------------------+
//! | Directives (if flagged, bitcode + LZ4)         |
//! +------------------------------------------------+
//! ```

use std::io::{Read, Write};

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use crate::replay::input::{ControllerInput, INPUT_SIZE, InputResolver};
use crate::replay::script::{FrameDirective, MAX_PLAYERS, ScriptHeader, Timeline};
use crate::replay::types::{
    InputSequence, Replay, ReplayFlags, ReplayHeader, console_id, console_name,
};

/// Longest run the binary format stores, about 19 hours at 60 ticks per second
pub const MAX_FRAMES: u64 = 1 << 22;

/// Errors reading or writing binary replays
#[derive(Debug, thiserror::Error)]
pub enum BinaryFormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported input size {0} (expected {INPUT_SIZE})")]
    UnsupportedInputSize(u8),
    #[error("invalid player count {0}")]
    InvalidPlayerCount(u8),
    #[error("{0} frames exceeds the binary format limit of {MAX_FRAMES}")]
    TooManyFrames(u64),
    #[error("corrupt replay: {0}")]
    Corrupt(String),
}

impl Replay {
    /// Build a replay from a timeline, expanding held inputs into a dense stream
    ///
    /// Fails with [`BinaryFormatError::TooManyFrames`] past [`MAX_FRAMES`].
    pub fn from_timeline(timeline: &Timeline) -> Result<Self, BinaryFormatError> {
        let frame_count = timeline.frame_count();
        if frame_count > MAX_FRAMES {
            return Err(BinaryFormatError::TooManyFrames(frame_count));
        }

        let mut resolver = InputResolver::new(timeline.header.players);
        let mut inputs = InputSequence::new();
        for tick in 0..frame_count {
            inputs.push_frame(resolver.resolve(timeline.directive_at(tick)).to_vec());
        }

        Ok(Self {
            header: ReplayHeader {
                console_id: console_id(&timeline.header.console),
                player_count: timeline.header.players,
                input_size: INPUT_SIZE as u8,
                flags: ReplayFlags::COMPRESSED_INPUTS | ReplayFlags::HAS_DIRECTIVES,
                reserved: [0; 4],
                seed: timeline.header.seed,
                frame_count,
            },
            inputs,
            timeline: Some(timeline.clone()),
        })
    }

    /// Recover the timeline
    ///
    /// Uses the directive section when present. Otherwise one directive is
    /// emitted per input change, and trailing idle ticks are dropped.
    pub fn to_timeline(&self) -> Timeline {
        if let Some(timeline) = &self.timeline {
            return timeline.clone();
        }

        let header = ScriptHeader {
            console: console_name(self.header.console_id),
            seed: self.header.seed,
            players: self.header.player_count,
        };

        let players = usize::from(self.header.player_count).min(MAX_PLAYERS);
        let mut held = vec![ControllerInput::IDLE; players];
        let mut directives = Vec::new();
        let mut last_tick = None;

        for (tick, frame) in self.inputs.iter().enumerate() {
            let tick = tick as u64;
            let mut directive = FrameDirective::new(tick);
            for (slot, input) in frame.iter().take(players).enumerate() {
                if *input != held[slot] {
                    directive.inputs[slot] = Some(*input);
                    held[slot] = *input;
                }
            }
            if directive.inputs.iter().any(Option::is_some) {
                directives.push(directive);
            }
            last_tick = Some(tick);
        }

        // Keep the run length when the final input is still held
        let still_held = held.iter().any(|input| !input.is_idle());
        if let Some(last_tick) = last_tick.filter(|_| still_held) {
            if directives.last().map(|d| d.tick) != Some(last_tick) {
                directives.push(FrameDirective::new(last_tick));
            }
        }

        Timeline::from_parts(header, directives)
    }
}

/// Compile a timeline to binary form
pub fn write_timeline<W: Write>(timeline: &Timeline, writer: W) -> Result<(), BinaryFormatError> {
    BinaryWriter::new(writer).write_replay(&Replay::from_timeline(timeline)?)
}

/// Read a binary replay back into a timeline
pub fn read_timeline<R: Read>(reader: R) -> Result<Timeline, BinaryFormatError> {
    Ok(BinaryReader::new(reader).read_replay()?.to_timeline())
}
