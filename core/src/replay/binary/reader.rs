//! Binary replay format reader
//!
//! Reads .ncrp replay files with automatic decompression.

use super::{BinaryFormatError, MAX_FRAMES};
use crate::replay::input::{ControllerInput, INPUT_SIZE};
use crate::replay::script::{MAX_PLAYERS, Timeline};
use crate::replay::types::*;
use byteorder::{LittleEndian, ReadBytesExt};
use lz4_flex::decompress;
use std::io::Read;

/// Upper bound on how far one LZ4 block byte can expand
const MAX_LZ4_RATIO: usize = 255;

/// Reader for binary replay format
pub struct BinaryReader<R: Read> {
    reader: R,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a complete replay from the input
    pub fn read_replay(&mut self) -> Result<Replay, BinaryFormatError> {
        let header = self.read_header()?;
        let inputs = self.read_inputs(&header)?;

        let timeline = if header.flags.contains(ReplayFlags::HAS_DIRECTIVES) {
            Some(self.read_directives(&header)?)
        } else {
            None
        };

        Ok(Replay {
            header,
            inputs,
            timeline,
        })
    }

    /// Read the 24-byte header
    fn read_header(&mut self) -> Result<ReplayHeader, BinaryFormatError> {
        let console_id = self.reader.read_u8()?;
        let player_count = self.reader.read_u8()?;
        let input_size = self.reader.read_u8()?;
        let flags = ReplayFlags::from_bits_truncate(self.reader.read_u8()?);

        let mut reserved = [0u8; 4];
        self.reader.read_exact(&mut reserved)?;

        let seed = self.reader.read_u64::<LittleEndian>()?;
        let frame_count = self.reader.read_u64::<LittleEndian>()?;

        if usize::from(input_size) != INPUT_SIZE {
            return Err(BinaryFormatError::UnsupportedInputSize(input_size));
        }
        if !(1..=MAX_PLAYERS as u8).contains(&player_count) {
            return Err(BinaryFormatError::InvalidPlayerCount(player_count));
        }
        if frame_count > MAX_FRAMES {
            return Err(BinaryFormatError::TooManyFrames(frame_count));
        }

        Ok(ReplayHeader {
            console_id,
            player_count,
            input_size,
            flags,
            reserved,
            seed,
            frame_count,
        })
    }

    /// Read the input stream
    fn read_inputs(&mut self, header: &ReplayHeader) -> Result<InputSequence, BinaryFormatError> {
        let frame_bytes = header.player_count as usize * INPUT_SIZE;
        // Header checks bound this to MAX_FRAMES * MAX_PLAYERS * INPUT_SIZE
        let total = header.frame_count as usize * frame_bytes;

        let raw = if header.flags.contains(ReplayFlags::COMPRESSED_INPUTS) {
            let compressed = self.read_section()?;
            let mut delta_buffer = decompress_bounded(&compressed, total)?;

            // Undo the XOR deltas in place
            for i in frame_bytes..delta_buffer.len() {
                delta_buffer[i] ^= delta_buffer[i - frame_bytes];
            }
            delta_buffer
        } else {
            let raw = self.read_exactly(total)?;
            if raw.len() != total {
                return Err(BinaryFormatError::Corrupt(format!(
                    "input stream holds {} bytes, expected {}",
                    raw.len(),
                    total
                )));
            }
            raw
        };

        let mut inputs = InputSequence::new();
        for frame in raw.chunks_exact(frame_bytes) {
            let players = frame
                .chunks_exact(INPUT_SIZE)
                .filter_map(ControllerInput::from_bytes)
                .collect();
            inputs.push_frame(players);
        }
        Ok(inputs)
    }

    /// Read the sparse directive section and check it against the header
    fn read_directives(&mut self, header: &ReplayHeader) -> Result<Timeline, BinaryFormatError> {
        let compressed = self.read_section()?;
        let encoded = decompress_bounded(&compressed, declared_size(&compressed)?)?;
        let timeline: Timeline = bitcode::decode(&encoded)
            .map_err(|e| BinaryFormatError::Corrupt(format!("directive section: {}", e)))?;

        if timeline.header.players != header.player_count {
            return Err(BinaryFormatError::Corrupt(format!(
                "directive section declares {} player(s), header declares {}",
                timeline.header.players, header.player_count
            )));
        }
        if let Some(violation) = timeline.invariant_violation() {
            return Err(BinaryFormatError::Corrupt(format!(
                "directive section: {}",
                violation
            )));
        }
        if timeline.frame_count() != header.frame_count {
            return Err(BinaryFormatError::Corrupt(format!(
                "directive section spans {} frames, header declares {}",
                timeline.frame_count(),
                header.frame_count
            )));
        }
        Ok(timeline)
    }

    /// Length-prefixed LZ4 section
    fn read_section(&mut self) -> Result<Vec<u8>, BinaryFormatError> {
        let len = self.reader.read_u32::<LittleEndian>()? as usize;
        let section = self.read_exactly(len)?;
        if section.len() != len {
            return Err(BinaryFormatError::Corrupt(format!(
                "section holds {} bytes, expected {}",
                section.len(),
                len
            )));
        }
        Ok(section)
    }

    /// Up to `len` bytes, growing the buffer only as data arrives
    fn read_exactly(&mut self, len: usize) -> Result<Vec<u8>, BinaryFormatError> {
        let mut buffer = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Uncompressed size from an LZ4 block's 4-byte prefix
fn declared_size(compressed: &[u8]) -> Result<usize, BinaryFormatError> {
    let mut prefix = compressed;
    prefix
        .read_u32::<LittleEndian>()
        .map(|size| size as usize)
        .map_err(|_| BinaryFormatError::Corrupt("LZ4 block is missing its size prefix".to_string()))
}

/// Decompress a size-prefixed LZ4 block that must expand to exactly `expected` bytes
///
/// The prefix is checked against `expected` and the block length before allocating.
fn decompress_bounded(compressed: &[u8], expected: usize) -> Result<Vec<u8>, BinaryFormatError> {
    let declared = declared_size(compressed)?;
    if declared != expected {
        return Err(BinaryFormatError::Corrupt(format!(
            "LZ4 block declares {} bytes, expected {}",
            declared, expected
        )));
    }
    if declared > compressed.len().saturating_mul(MAX_LZ4_RATIO) {
        return Err(BinaryFormatError::Corrupt(format!(
            "LZ4 block of {} bytes cannot expand to {} bytes",
            compressed.len(),
            declared
        )));
    }

    let decompressed = decompress(&compressed[4..], declared)
        .map_err(|e| BinaryFormatError::Corrupt(e.to_string()))?;
    if decompressed.len() != declared {
        return Err(BinaryFormatError::Corrupt(format!(
            "LZ4 block expanded to {} bytes, expected {}",
            decompressed.len(),
            declared
        )));
    }
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::writer::BinaryWriter;

    fn replay_with(inputs: InputSequence, flags: ReplayFlags) -> Replay {
        Replay {
            header: ReplayHeader {
                console_id: 1,
                player_count: 1,
                input_size: INPUT_SIZE as u8,
                flags,
                reserved: [0; 4],
                seed: 12345,
                frame_count: inputs.frame_count(),
            },
            inputs,
            timeline: None,
        }
    }

    #[test]
    fn test_roundtrip_empty() {
        let replay = Replay::default();

        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer).write_replay(&replay).unwrap();
        let parsed = BinaryReader::new(buffer.as_slice()).read_replay().unwrap();

        assert_eq!(parsed.header.console_id, replay.header.console_id);
        assert_eq!(parsed.header.player_count, replay.header.player_count);
        assert_eq!(parsed.inputs.frame_count(), 0);
    }

    #[test]
    fn test_roundtrip_with_inputs() {
        let mut inputs = InputSequence::new();
        inputs.push_frame(vec![ControllerInput::from_buttons(0x0F)]);
        inputs.push_frame(vec![ControllerInput {
            left_stick_x: -127,
            right_trigger: 9,
            ..ControllerInput::from_buttons(0x1F)
        }]);
        inputs.push_frame(vec![ControllerInput::from_buttons(0x0F)]);

        let replay = replay_with(inputs, ReplayFlags::empty());

        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer).write_replay(&replay).unwrap();
        let parsed = BinaryReader::new(buffer.as_slice()).read_replay().unwrap();

        assert_eq!(parsed, replay);
    }

    #[test]
    fn test_roundtrip_compressed() {
        let mut inputs = InputSequence::new();
        // Mostly-idle input compresses well
        for i in 0..100 {
            let buttons = if i % 10 == 0 { 0x01 } else { 0x00 };
            inputs.push_frame(vec![ControllerInput::from_buttons(buttons)]);
        }

        let replay = replay_with(inputs, ReplayFlags::COMPRESSED_INPUTS);

        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer).write_replay(&replay).unwrap();

        // Smaller than the raw 800 byte stream
        assert!(buffer.len() < 24 + 800);

        let parsed = BinaryReader::new(buffer.as_slice()).read_replay().unwrap();
        assert_eq!(parsed.inputs.frame_count(), 100);
        assert_eq!(parsed.inputs.get_frame(0).unwrap()[0].buttons, 0x01);
        assert_eq!(parsed.inputs.get_frame(1).unwrap()[0].buttons, 0x00);
        assert_eq!(parsed.inputs.get_frame(10).unwrap()[0].buttons, 0x01);
    }

    #[test]
    fn test_rejects_foreign_input_size() {
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer)
            .write_replay(&Replay::default())
            .unwrap();
        buffer[2] = 4;

        let err = BinaryReader::new(buffer.as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::UnsupportedInputSize(4)));
    }

    #[test]
    fn test_truncated_file() {
        let mut inputs = InputSequence::new();
        inputs.push_frame(vec![ControllerInput::from_buttons(0x01)]);
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer)
            .write_replay(&replay_with(inputs, ReplayFlags::empty()))
            .unwrap();
        buffer.truncate(28);

        let err = BinaryReader::new(buffer.as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::Corrupt(_)));
    }

    fn header_bytes(flags: ReplayFlags, frame_count: u64) -> Vec<u8> {
        let mut buffer = vec![1, 1, INPUT_SIZE as u8, flags.bits(), 0, 0, 0, 0];
        buffer.extend_from_slice(&0u64.to_le_bytes());
        buffer.extend_from_slice(&frame_count.to_le_bytes());
        buffer
    }

    #[test]
    fn test_rejects_oversized_frame_count() {
        let buffer = header_bytes(ReplayFlags::empty(), 1 << 40);
        let err = BinaryReader::new(buffer.as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::TooManyFrames(count) if count == 1 << 40));
    }

    #[test]
    fn test_header_without_stream_is_corrupt() {
        // Within the frame limit but no bytes behind the header
        let buffer = header_bytes(ReplayFlags::empty(), MAX_FRAMES);
        let err = BinaryReader::new(buffer.as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::Corrupt(_)));
    }

    #[test]
    fn test_rejects_forged_lz4_size() {
        let mut buffer = header_bytes(ReplayFlags::COMPRESSED_INPUTS, MAX_FRAMES);
        // Six-byte block claiming to expand to the full stream
        let block_size = (MAX_FRAMES as usize * INPUT_SIZE) as u32;
        buffer.extend_from_slice(&6u32.to_le_bytes());
        buffer.extend_from_slice(&block_size.to_le_bytes());
        buffer.extend_from_slice(&[0x10, 0x00]);

        let err = BinaryReader::new(buffer.as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::Corrupt(_)));
    }

    fn directive_replay() -> Replay {
        let timeline = Timeline::from_toml(
            r#"
console = "zx"
seed = 0
players = 1
frames = [{ f = 3 }, { f = 5, assert = "$counter == 999" }]
"#,
        )
        .unwrap();
        Replay::from_timeline(&timeline).unwrap()
    }

    fn write(replay: &Replay) -> Vec<u8> {
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer).write_replay(replay).unwrap();
        buffer
    }

    #[test]
    fn test_directive_section_roundtrip() {
        let replay = directive_replay();
        let parsed = BinaryReader::new(write(&replay).as_slice()).read_replay().unwrap();
        assert_eq!(parsed.timeline, replay.timeline);
    }

    #[test]
    fn test_rejects_unordered_directives() {
        let mut replay = directive_replay();
        if let Some(timeline) = replay.timeline.as_mut() {
            timeline.directives_mut().swap(0, 1);
        }

        let err = BinaryReader::new(write(&replay).as_slice()).read_replay().unwrap_err();
        match err {
            BinaryFormatError::Corrupt(message) => {
                assert!(message.contains("tick 3 does not come after tick 5"), "{}", message)
            }
            other => panic!("expected corrupt directive section, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_directive_player_mismatch() {
        let mut replay = directive_replay();
        if let Some(timeline) = replay.timeline.as_mut() {
            timeline.header.players = 2;
        }
        let err = BinaryReader::new(write(&replay).as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::Corrupt(_)));

        let mut replay = directive_replay();
        if let Some(timeline) = replay.timeline.as_mut() {
            timeline.directives_mut()[0].inputs[1] = Some(ControllerInput::from_buttons(0x01));
        }
        let err = BinaryReader::new(write(&replay).as_slice()).read_replay().unwrap_err();
        assert!(matches!(err, BinaryFormatError::Corrupt(_)));
    }
}
