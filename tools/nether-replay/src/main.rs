//! Nether Replay - Replay script runner for Nethercore simulations
//!
//! # Commands
//!
//! - `nether-replay run` - Execute one or more scripts and write reports
//! - `nether-replay validate` - Parse and validate a script without running
//! - `nether-replay compile` - Compile a script to the binary format (.ncrp)
//! - `nether-replay decompile` - Convert a binary replay back to a script
//!
//! # Usage
//!
//! ```bash
//! # Run a script against the reference simulation
//! nether-replay run tests/jump.ncrs --report jump.report.json
//!
//! # Run a directory of regression scripts in parallel
//! nether-replay run tests/*.ncrs --report-dir target/reports --jobs 4
//! ```
//!
//! # Exit codes
//!
//! - `0` all assertions passed
//! - `1` one or more assertions failed
//! - `2` parse/validation error
//! - `3` timeout reached

mod compile;
mod decompile;
mod outcome;
mod run;
mod validate;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use outcome::Outcome;

/// Nether Replay - Replay script runner for Nethercore simulations
#[derive(Parser)]
#[command(name = "nether-replay")]
#[command(about = "Run, validate and compile Nethercore replay scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute replay scripts and generate reports
    Run(run::RunArgs),

    /// Validate a script without running
    Validate(validate::ValidateArgs),

    /// Compile script to binary
    Compile(compile::CompileArgs),

    /// Decompile binary to script
    Decompile(decompile::DecompileArgs),
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args),
        Commands::Validate(args) => validate::execute(args),
        Commands::Compile(args) => compile::execute(args),
        Commands::Decompile(args) => decompile::execute(args),
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Outcome::InvalidScript.into()
        }
    }
}
