//! Script replay format (.ncrs)
//!
//! The script format is a human-readable TOML format designed for:
//! - Manual test case creation
//! - Regression scripts checked into a game's repository
//! - Debugging with snap/assert flags
//!
//! # Example Script
//!
//! ```toml
//! console = "zx"
//! seed = 12345
//! players = 1
//!
//! frames = [
//!   { f = 0, p1 = "idle", snap = true },
//!   { f = 1, p1 = "a", snap = true, assert = "$velocity_y < 0" },
//!   { f = 60, p1 = "idle", snap = true },
//! ]
//! ```
//!
//! # Input Formats
//!
//! - **Symbolic**: `"idle"`, `"a"`, `"right+a"`, `"up+right+b"`
//! - **Bitmask**: `0x18`
//! - **Raw bytes**: `[0x18, 0x00, 0x7f, 0x00, 0x00, 0x00, 0x00, 0x00]`
//! - **Structured**: `{ buttons = ["a"], lstick = [1.0, 0.0], rt = 0.8 }`
//!
//! Inputs are held: a player keeps its last input until a later frame
//! entry sets a new one.

mod ast;
mod compiler;
mod decompiler;
mod parser;
mod timeline;
mod validation;

pub use ast::{FrameEntry, InputValue, ReplayScript, StructuredInput};
pub use decompiler::decompile;
pub use parser::{ParseErrorKind, Position, ScriptParseError};
pub use timeline::{ActionCall, FrameDirective, MAX_PLAYERS, ScriptHeader, Timeline};
pub use validation::validate_script;
