//! Execute replay scripts and generate reports

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use nethercore_replay::config::{self, RunnerConfig};
use nethercore_replay::replay::AssertionResult;
use nethercore_replay::{BatchJob, ExecutionReport, ReferenceSim, Timeline, run_batch};

use crate::outcome::Outcome;

#[derive(Args)]
pub struct RunArgs {
    /// Script files (.ncrs)
    #[arg(required = true)]
    pub scripts: Vec<PathBuf>,

    /// Output report file (JSON), single script only
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Directory for `<script>.report.json` files
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Run without rendering
    #[arg(long)]
    pub headless: bool,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Maximum execution time in seconds per script (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Omit timing fields so reports diff cleanly
    #[arg(long)]
    pub canonical: bool,

    /// Runner config file (defaults to replay.toml in the config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scripts to run in parallel (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl RunArgs {
    /// Merge flags over the loaded config
    fn runner_config(&self) -> RunnerConfig {
        let mut config = match &self.config {
            Some(path) => config::load_from(path),
            None => config::load(),
        };

        config.fail_fast |= self.fail_fast;
        config.canonical_reports |= self.canonical;
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(dir) = &self.report_dir {
            config.report_dir = Some(dir.clone());
        }
        config
    }
}

/// Execute replay scripts
pub fn execute(args: RunArgs) -> Result<Outcome> {
    let config = args.runner_config();

    println!("Executing {} script(s)", args.scripts.len());
    if !args.headless {
        debug!("no renderer is attached, running headless");
    }
    println!("  Fail-fast: {}", config.fail_fast);
    match config.timeout() {
        Some(timeout) => println!("  Timeout: {}s", timeout.as_secs()),
        None => println!("  Timeout: none"),
    }

    if args.report.is_some() && args.scripts.len() > 1 {
        warn!("--report is ignored when running several scripts; use --report-dir");
    }

    // Parse everything first; a bad script never reaches the engine
    let mut outcome = Outcome::Passed;
    let mut jobs = Vec::new();
    let mut paths = Vec::new();
    for path in &args.scripts {
        match Timeline::from_file(path) {
            Ok(timeline) => {
                jobs.push(BatchJob {
                    name: script_name(path),
                    timeline,
                });
                paths.push(path.as_path());
            }
            Err(e) => {
                eprintln!();
                eprintln!("=== Parse Error ===");
                eprintln!("{}: {}", path.display(), e);
                outcome = outcome.combine(Outcome::InvalidScript);
            }
        }
    }

    if jobs.is_empty() {
        return Ok(outcome);
    }

    let reports = run_batch(jobs, &config.engine_config(None), config.jobs, ReferenceSim::new)
        .context("Failed to start batch worker pool")?;

    for (path, report) in paths.iter().zip(&reports) {
        print_report(path, report);

        let destination = report_path(
            path,
            args.report.as_deref().filter(|_| args.scripts.len() == 1),
            config.report_dir.as_deref(),
        );
        if let Some(destination) = destination {
            write_report(report, &destination, config.canonical_reports)?;
            println!("Report written to: {}", destination.display());
        }

        outcome = outcome.combine(report.status().into());
    }

    Ok(outcome)
}

fn script_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Where a script's report goes: explicit path, then report directory
fn report_path(script: &Path, report: Option<&Path>, report_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(report) = report {
        return Some(report.to_path_buf());
    }
    report_dir.map(|dir| {
        let stem = script
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        dir.join(format!("{}.report.json", stem))
    })
}

fn write_report(report: &ExecutionReport, path: &Path, canonical: bool) -> Result<()> {
    let json = if canonical {
        report.to_canonical_json()
    } else {
        report.to_json()
    }
    .context("Failed to serialize report")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| "Failed to write report")?;
    Ok(())
}

fn print_report(path: &Path, report: &ExecutionReport) {
    println!();
    println!("=== {} ===", path.display());
    println!("Console: {}", report.console);
    println!("Seed: {}", report.seed);
    println!("Frames executed: {}", report.frames_executed);
    println!("Snap frames: {}", report.summary.frames_with_snap);

    let failed: Vec<_> = report.failed_assertions().collect();
    if !failed.is_empty() {
        println!();
        println!("=== Failed Assertions ===");
        for assertion in failed {
            println!("  {}", describe_failure(assertion));
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("=== Runtime Errors ===");
        for error in &report.errors {
            println!("  frame {}: [{}] {}", error.frame, error.kind, error.message);
        }
    }

    println!();
    println!(
        "Assertions: {} passed, {} failed",
        report.summary.assertions_passed, report.summary.assertions_failed
    );
    println!("Status: {}", report.status());
}

/// `frame N: <condition> (actual X, expected Y)`
fn describe_failure(assertion: &AssertionResult) -> String {
    let actual = assertion
        .actual
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());
    let expected = assertion.expected.as_deref().unwrap_or("?");
    let mut line = format!(
        "frame {}: {} (actual {}, expected {})",
        assertion.frame, assertion.condition, actual, expected
    );
    if let Some(note) = &assertion.note {
        line.push_str(&format!(" - {}", note));
    }
    line
}
