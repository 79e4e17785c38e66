use anyhow::{Context, Result};
use footprint_integrations::CollectorConfig;
use footprint_storage::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::host::DEFAULT_REQUEST_TIMEOUT;
use crate::monitor::DEFAULT_DEBOUNCE;
use crate::privacy::{UrlFilter, DEFAULT_INTERNAL_PREFIXES};

const CONFIG_FILE: &str = "config.toml";

/// Get the local data directory for footprint.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("footprint");
    Ok(path)
}

/// Runtime configuration read from `<data_dir>/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Focus-loss debounce window
    pub debounce_ms: u64,
    pub retention_days: u32,
    /// URL prefixes of browser-internal pages that never start a session
    pub internal_prefixes: Vec<String>,
    /// Bound on host round-trips (active tab queries, page text requests)
    pub host_request_timeout_ms: u64,
    /// Time in-flight uploads get to finish at shutdown
    pub shutdown_grace_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(250),
            retention_days: DEFAULT_RETENTION_DAYS,
            internal_prefixes: DEFAULT_INTERNAL_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            host_request_timeout_ms: u64::try_from(DEFAULT_REQUEST_TIMEOUT.as_millis())
                .unwrap_or(5000),
            shutdown_grace_ms: 2000,
        }
    }
}

impl TrackerConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn host_request_timeout(&self) -> Duration {
        Duration::from_millis(self.host_request_timeout_ms)
    }

    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    #[must_use]
    pub fn url_filter(&self) -> UrlFilter {
        UrlFilter::new(self.internal_prefixes.clone())
    }
}

impl Config {
    /// Path of the config file in the data directory
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_data_dir()?.join(CONFIG_FILE))
    }

    /// Load the config at `path`, falling back to defaults when the file is absent
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Load the config from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
