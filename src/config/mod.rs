// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Telemetry source configuration
    pub telemetry: TelemetryConfig,

    /// Monitoring session configuration
    pub session: SessionConfig,

    /// Reference data, model and log locations
    pub data: DataConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            telemetry: TelemetryConfig::default(),
            session: SessionConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("enginewatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Telemetry source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Live endpoint; synthetic-only when unset
    pub endpoint: Option<String>,

    /// Per-request bound in milliseconds
    pub timeout_ms: u64,

    /// Seed for the synthetic engine; entropy when unset
    pub seed: Option<u64>,
}

impl TelemetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 2000,
            seed: None,
        }
    }
}

/// Monitoring session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between ticks in milliseconds; 0 disables pacing
    pub tick_interval_ms: u64,

    /// Safety ceiling on ticks per run
    pub max_ticks: u64,
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            max_ticks: 1000,
        }
    }
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Reference dataset (CSV)
    pub reference_dataset: PathBuf,

    /// Classifier artifact (JSON decision tree)
    pub model: PathBuf,

    /// Append-only maintenance log (CSV)
    pub log_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            reference_dataset: PathBuf::from("./assets/engine_failure_features.csv"),
            model: PathBuf::from("./assets/engine_model.json"),
            log_file: PathBuf::from("./data/maintenance_log.csv"),
        }
    }
}
