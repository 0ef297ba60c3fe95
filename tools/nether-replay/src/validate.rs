//! Validate a replay script without running

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use nethercore_replay::{DebugRegistry, ReferenceSim, Simulation, Timeline};

use crate::outcome::Outcome;

#[derive(Args)]
pub struct ValidateArgs {
    /// Script file (.ncrs)
    pub script: PathBuf,
}

/// Validate a replay script
pub fn execute(args: ValidateArgs) -> Result<Outcome> {
    println!("Validating script: {}", args.script.display());

    let timeline = match Timeline::from_file(&args.script) {
        Ok(timeline) => timeline,
        Err(e) => {
            eprintln!();
            eprintln!("=== Script Invalid ===");
            eprintln!("{}", e);
            return Ok(Outcome::InvalidScript);
        }
    };

    // Report statistics
    println!();
    println!("=== Script Valid ===");
    println!("Console: {}", timeline.header.console);
    println!("Seed: {}", timeline.header.seed);
    println!("Players: {}", timeline.header.players);
    println!("Frames: {}", timeline.directives().len());
    println!("Ticks to run: {}", timeline.frame_count());

    println!();
    println!("Snap frames: {}", timeline.snap_count());
    println!("Assertions: {}", timeline.assertion_count());
    println!("Actions: {}", timeline.action_count());

    let warnings = catalog_warnings(&timeline)?;
    if !warnings.is_empty() {
        println!();
        println!("=== Reference Simulation Warnings ===");
        for warning in &warnings {
            println!("  {}", warning);
        }
    }

    Ok(Outcome::Passed)
}

/// Names the reference simulation does not register
///
/// These are runtime errors rather than parse errors, so they only warn.
fn catalog_warnings(timeline: &Timeline) -> Result<Vec<String>> {
    let mut sim = ReferenceSim::new();
    let mut registry = DebugRegistry::new();
    sim.seed(timeline.header.seed);
    sim.init(&mut registry)?;
    registry.finalize_registration();

    let mut warnings = Vec::new();
    for directive in timeline.directives() {
        if let Some(assertion) = directive
            .assertion
            .as_ref()
            .filter(|a| registry.variable(&a.variable).is_none())
        {
            warnings.push(format!(
                "frame {}: unknown variable ${}",
                directive.tick, assertion.variable
            ));
        }
        if let Some(action) = directive
            .action
            .as_ref()
            .filter(|a| registry.action(&a.name).is_none())
        {
            warnings.push(format!("frame {}: unknown action '{}'", directive.tick, action.name));
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("script.ncrs");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_valid_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = write(
            dir.path(),
            "console = \"zx\"\nseed = 1\nplayers = 1\nframes = [{ f = 0, p1 = \"a\" }]\n",
        );
        assert_eq!(execute(ValidateArgs { script }).unwrap(), Outcome::Passed);
    }

    #[test]
    fn test_invalid_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = write(
            dir.path(),
            "console = \"zx\"\nseed = 1\nplayers = 1\nframes = [{ f = 0, p1 = \"jump\" }]\n",
        );
        assert_eq!(execute(ValidateArgs { script }).unwrap(), Outcome::InvalidScript);
    }

    #[test]
    fn test_catalog_warnings() {
        let timeline = Timeline::from_toml(
            r#"
console = "zx"
seed = 0
players = 1
frames = [
  { f = 0, action = "Spawn Boss", assert = "$lives > 0" },
  { f = 1, action = "Load Level", assert = "$level == 1" },
]
"#,
        )
        .unwrap();
        let warnings = catalog_warnings(&timeline).unwrap();
        assert_eq!(
            warnings,
            vec![
                "frame 0: unknown variable $lives".to_string(),
                "frame 0: unknown action 'Spawn Boss'".to_string(),
            ]
        );
    }
}
