//! Host configuration, parsed from a TOML file plus environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use ownerheir_ledger::HeartbeatConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// General settings
    #[serde(default)]
    pub server: ServerSection,

    /// Check-in thresholds for status and watch output
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Caller secret key (hex). Usually supplied via `OWNERHEIR_KEY` or `--key`.
    #[serde(default, skip_serializing)]
    pub key: Option<String>,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Data directory (ledger state, event journal)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Watch interval in seconds (default: 1 hour)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            check_interval_secs: default_check_interval(),
            log_level: default_log_level(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("ownerheir-data")
}

fn default_check_interval() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OWNERHEIR_DATA_DIR`
    /// - `OWNERHEIR_CHECK_INTERVAL`
    /// - `OWNERHEIR_LOG_LEVEL`
    /// - `OWNERHEIR_KEY`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OWNERHEIR_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("OWNERHEIR_CHECK_INTERVAL") {
            if let Ok(secs) = v.parse::<u64>() {
                self.server.check_interval_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("OWNERHEIR_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("OWNERHEIR_KEY") {
            self.key = Some(v);
        }
    }

    /// Path of the ledger state file
    pub fn ledger_path(&self) -> PathBuf {
        self.server.data_dir.join("ledger.json")
    }

    /// Path of the event journal
    pub fn journal_path(&self) -> PathBuf {
        self.server.data_dir.join("events.jsonl")
    }

    /// The configured caller key, wiped when dropped
    pub fn key(&self) -> Option<Zeroizing<String>> {
        self.key.clone().map(Zeroizing::new)
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.data_dir.as_os_str().is_empty(),
            "server.data_dir must not be empty"
        );

        anyhow::ensure!(
            self.server.check_interval_secs >= 60,
            "server.check_interval_secs must be >= 60"
        );

        self.heartbeat
            .validate()
            .context("Invalid [heartbeat] section")?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
