// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application configuration loading.
//!
//! The gateway reads one YAML file assembling the per-layer configuration
//! sections:
//!
//! ```yaml
//! api:
//!   host: 0.0.0.0
//!   port: 8000
//! database:
//!   path: data/tagbus.db
//! journal:
//!   dir: logs/control
//! modbus:
//!   connect_timeout: 3s
//!   max_retries: 3
//! ```
//!
//! Every field has a default, so an empty file (or a missing one, for the
//! `run` command) yields a working local configuration. A handful of
//! environment variables override the file after parsing:
//!
//! - `TAGBUS_API_HOST` / `TAGBUS_API_PORT`
//! - `TAGBUS_DATABASE_PATH`
//! - `TAGBUS_JOURNAL_DIR`

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tagbus_api::ApiConfig;
use tagbus_core::error::{ConfigError, ConfigResult};
use tagbus_modbus::ConnectConfig;

// =============================================================================
// AppConfig
// =============================================================================

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Configuration store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Control journal settings.
    #[serde(default)]
    pub journal: JournalConfig,

    /// Modbus connection parameters applied to every endpoint.
    #[serde(default)]
    pub modbus: ConnectConfig,
}

/// Configuration store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/tagbus.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Control journal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Directory the day-keyed journal files are written into.
    #[serde(default = "default_journal_dir")]
    pub dir: PathBuf,
}

fn default_journal_dir() -> PathBuf {
    PathBuf::from("logs/control")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: default_journal_dir(),
        }
    }
}

impl AppConfig {
    /// Validates the assembled configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.host.trim().is_empty() {
            return Err(ConfigError::validation("api.host", "cannot be empty"));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::validation("database.path", "cannot be empty"));
        }
        if self.journal.dir.as_os_str().is_empty() {
            return Err(ConfigError::validation("journal.dir", "cannot be empty"));
        }
        if self.modbus.connect_timeout.is_zero() {
            return Err(ConfigError::validation(
                "modbus.connect_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads, overrides, and validates configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading configuration");

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::parse(path, format!("failed to read file: {}", e)))?;

    let mut config: AppConfig = serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::parse(path, e.to_string()))?;

    apply_env_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}

/// Loads configuration, falling back to defaults when the file is absent.
///
/// Used by the `run` command so a fresh checkout starts without a config
/// file; `validate` still requires the file to exist.
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    warn!(
        path = %path.display(),
        "Configuration file not found; using defaults"
    );
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) -> ConfigResult<()> {
    if let Ok(host) = env::var("TAGBUS_API_HOST") {
        config.api.host = host;
    }
    if let Ok(port) = env::var("TAGBUS_API_PORT") {
        config.api.port = port.parse().map_err(|_| {
            ConfigError::validation("api.port", format!("invalid TAGBUS_API_PORT '{}'", port))
        })?;
    }
    if let Ok(path) = env::var("TAGBUS_DATABASE_PATH") {
        config.database.path = PathBuf::from(path);
    }
    if let Ok(dir) = env::var("TAGBUS_JOURNAL_DIR") {
        config.journal.dir = PathBuf::from(dir);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
