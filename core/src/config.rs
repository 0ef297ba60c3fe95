//! Runner configuration (replay.toml)
//!
//! Defaults for the replay runner, stored in TOML format in the
//! platform-specific config directory. Command-line flags override every
//! value loaded here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::replay::EngineConfig;

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE: &str = "replay.toml";

/// Replay runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Stop at the first failed assertion or runtime error (default: false)
    #[serde(default)]
    pub fail_fast: bool,
    /// Wall-clock limit per script in seconds, 0 disables it (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory reports are written to when running several scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    /// Omit timing fields from written reports (default: false)
    #[serde(default)]
    pub canonical_reports: bool,
    /// Batch worker threads, 0 for one per core (default: 0)
    #[serde(default)]
    pub jobs: usize,
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            timeout_secs: default_timeout_secs(),
            report_dir: None,
            canonical_reports: false,
            jobs: 0,
        }
    }
}

impl RunnerConfig {
    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Engine settings for one run
    pub fn engine_config(&self, script_name: Option<String>) -> EngineConfig {
        EngineConfig {
            fail_fast: self.fail_fast,
            timeout: self.timeout(),
            script_name,
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Nethercore\config`
/// On macOS: `~/Library/Application Support/io.nethercore.Nethercore`
/// On Linux: `~/.config/Nethercore`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "Nethercore")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the runner configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> RunnerConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join(CONFIG_FILE)).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads the runner configuration from an explicit path.
///
/// Falls back to defaults with a warning if the file cannot be read or parsed.
pub fn load_from(path: &Path) -> RunnerConfig {
    match try_load_from(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config {}: {}", path.display(), e);
            RunnerConfig::default()
        }
    }
}

/// Reads and parses a config file, reporting why it failed.
pub fn try_load_from(path: &Path) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to `path`, creating parent directories.
pub fn save_to(config: &RunnerConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Config file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
