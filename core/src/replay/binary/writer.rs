//! Binary replay format writer
//!
//! Writes .ncrp replay files with optional compression.

use super::BinaryFormatError;
use crate::replay::input::INPUT_SIZE;
use crate::replay::types::*;
use byteorder::{LittleEndian, WriteBytesExt};
use lz4_flex::compress_prepend_size;
use std::io::Write;

/// Writer for binary replay format
pub struct BinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a complete replay to the output
    pub fn write_replay(&mut self, replay: &Replay) -> Result<(), BinaryFormatError> {
        let mut header = replay.header.clone();
        header.input_size = INPUT_SIZE as u8;
        header.frame_count = replay.inputs.frame_count();
        header
            .flags
            .set(ReplayFlags::HAS_DIRECTIVES, replay.timeline.is_some());

        self.write_header(&header)?;
        self.write_inputs(&replay.inputs, &header)?;

        if let Some(timeline) = &replay.timeline {
            let encoded = bitcode::encode(timeline);
            let compressed = compress_prepend_size(&encoded);
            self.writer
                .write_u32::<LittleEndian>(compressed.len() as u32)?;
            self.writer.write_all(&compressed)?;
        }

        Ok(())
    }

    /// Write the 24-byte header
    fn write_header(&mut self, header: &ReplayHeader) -> Result<(), BinaryFormatError> {
        self.writer.write_u8(header.console_id)?;
        self.writer.write_u8(header.player_count)?;
        self.writer.write_u8(header.input_size)?;
        self.writer.write_u8(header.flags.bits())?;
        self.writer.write_all(&header.reserved)?; // 4 reserved bytes
        self.writer.write_u64::<LittleEndian>(header.seed)?;
        self.writer.write_u64::<LittleEndian>(header.frame_count)?;
        Ok(())
    }

    /// Write the input stream
    fn write_inputs(
        &mut self,
        inputs: &InputSequence,
        header: &ReplayHeader,
    ) -> Result<(), BinaryFormatError> {
        let players = header.player_count as usize;

        if header.flags.contains(ReplayFlags::COMPRESSED_INPUTS) {
            // Delta compression: XOR against the previous frame, first frame against idle
            let mut prev_frame = vec![[0u8; INPUT_SIZE]; players];
            let mut delta_buffer = Vec::with_capacity(inputs.frame_count() as usize * players * INPUT_SIZE);

            for frame_inputs in inputs.iter() {
                for (prev, input) in prev_frame.iter_mut().zip(frame_inputs) {
                    let bytes = input.to_bytes();
                    for (p, b) in prev.iter_mut().zip(bytes) {
                        delta_buffer.push(b ^ *p);
                        *p = b;
                    }
                }
            }

            // Compress the delta buffer with LZ4
            let compressed = compress_prepend_size(&delta_buffer);
            self.writer
                .write_u32::<LittleEndian>(compressed.len() as u32)?;
            self.writer.write_all(&compressed)?;
        } else {
            // Uncompressed: write raw input bytes
            for frame_inputs in inputs.iter() {
                for input in frame_inputs.iter().take(players) {
                    self.writer.write_all(&input.to_bytes())?;
                }
            }
        }

        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
