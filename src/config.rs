//! Configuration loading.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for a reconstruction run.
///
/// All fields have working defaults; a config file only needs to name the
/// ones it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concurrent fragment fetches.
    pub fetch_concurrency: usize,
    /// Connect/read timeout for fragment requests, in seconds.
    pub fetch_timeout_secs: u64,
    /// Upper bound on a single muxing invocation, in seconds.
    pub mux_timeout_secs: u64,
    /// Final outputs smaller than this are suspect and skip cleanup.
    pub min_output_bytes: u64,
    /// Duplicate notices are suppressed for sequence numbers at or below
    /// this bound...
    pub duplicate_notice_min_sequence: u32,
    /// ...unless the capture yielded fewer locators than this.
    pub duplicate_notice_small_input: usize,
    /// Explicit ffmpeg binary path; falls back to PATH lookup.
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
            fetch_timeout_secs: 30,
            mux_timeout_secs: 600,
            min_output_bytes: 10_000,
            duplicate_notice_min_sequence: 5,
            duplicate_notice_small_input: 20,
            ffmpeg_path: None,
        }
    }
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn mux_timeout(&self) -> Duration {
        Duration::from_secs(self.mux_timeout_secs)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./harvid.toml", "~/.config/harvid/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.fetch_concurrency == 0 {
        anyhow::bail!("fetch_concurrency cannot be 0");
    }

    if config.mux_timeout_secs == 0 {
        anyhow::bail!("mux_timeout_secs cannot be 0");
    }

    if let Some(path) = &config.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    Ok(())
}
