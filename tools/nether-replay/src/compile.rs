//! Compile a replay script to binary format

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use nethercore_replay::Timeline;
use nethercore_replay::replay::write_timeline;

use crate::outcome::Outcome;

#[derive(Args)]
pub struct CompileArgs {
    /// Input script (.ncrs)
    pub input: PathBuf,

    /// Output binary (.ncrp)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Compile a script to binary format
pub fn execute(args: CompileArgs) -> Result<Outcome> {
    println!("Compiling: {} -> {}", args.input.display(), args.output.display());

    let timeline = match Timeline::from_file(&args.input) {
        Ok(timeline) => timeline,
        Err(e) => {
            eprintln!("Failed to parse script {}: {}", args.input.display(), e);
            return Ok(Outcome::InvalidScript);
        }
    };

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create output file: {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    write_timeline(&timeline, &mut writer).with_context(|| "Failed to write binary replay")?;
    writer.flush().with_context(|| "Failed to write binary replay")?;

    println!();
    println!("=== Compilation Complete ===");
    println!("Frames: {}", timeline.frame_count());
    println!("Players: {}", timeline.header.players);
    println!("Seed: {}", timeline.header.seed);

    Ok(Outcome::Passed)
}
