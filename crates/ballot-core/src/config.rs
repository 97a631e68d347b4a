use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::results::DEFAULT_LEADERBOARD_SIZE;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ballot.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Seconds between catalog reloads; 0 disables the refresher.
    #[serde(default = "default_catalog_refresh_secs")]
    pub catalog_refresh_secs: u64,
    #[serde(default)]
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            catalog_refresh_secs: default_catalog_refresh_secs(),
            cors_allow_any: false,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn catalog_refresh_interval(&self) -> Option<Duration> {
        if self.catalog_refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.catalog_refresh_secs))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsConfig {
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

/// Load `path`, falling back to defaults when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<BallotConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(BallotConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<BallotConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Render a config as TOML, used by `ballot init` to write the template.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_config(config: &BallotConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

const fn default_catalog_refresh_secs() -> u64 {
    30
}

fn default_database() -> PathBuf {
    PathBuf::from("ballot.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_leaderboard_size() -> usize {
    DEFAULT_LEADERBOARD_SIZE
}
