//! Decompile a binary replay to script format

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use nethercore_replay::replay::{decompile, read_timeline};

use crate::outcome::Outcome;

#[derive(Args)]
pub struct DecompileArgs {
    /// Input binary (.ncrp)
    pub input: PathBuf,

    /// Output script (.ncrs)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Decompile a binary replay to script format
pub fn execute(args: DecompileArgs) -> Result<Outcome> {
    println!("Decompiling: {} -> {}", args.input.display(), args.output.display());

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let timeline =
        read_timeline(BufReader::new(file)).with_context(|| "Failed to read binary replay")?;

    let script = decompile(&timeline);
    let toml_str = script
        .to_toml()
        .with_context(|| "Failed to serialize to TOML")?;

    std::fs::write(&args.output, toml_str)
        .with_context(|| format!("Failed to write output file: {}", args.output.display()))?;

    println!();
    println!("=== Decompilation Complete ===");
    println!("Console: {}", script.console);
    println!("Seed: {}", script.seed);
    println!("Players: {}", script.players);
    println!("Frames: {}", script.frames.len());

    Ok(Outcome::Passed)
}
