//! Configuration loading and resolution
//!
//! The configuration file is located in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SONGLIB_CONFIG` environment variable
//! 3. `<config dir>/songlib/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing default file never aborts startup. A file named explicitly (by
//! argument or environment) must exist and parse.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SONGLIB_CONFIG";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonglibConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub metadata: MetadataConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Routes are mounted under `/api/v{api_version}`
    pub api_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_version: "1".to_string(),
        }
    }
}

/// SQLite store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Upper bound for one store operation, transaction included
    pub operation_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 10,
            operation_timeout_secs: 15,
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection string for the configured database file
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Remote metadata service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://musicinfo/info".to_string(),
            timeout_secs: 30,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SonglibConfig {
    /// Parse a TOML document; omitted sections and keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load and validate a config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config file {} failed: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.api_version.trim().is_empty() {
            return Err(Error::Config("server.api_version must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config("database.max_connections must be at least 1".to_string()));
        }
        if self.database.operation_timeout_secs == 0 {
            return Err(Error::Config(
                "database.operation_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.metadata.timeout_secs == 0 {
            return Err(Error::Config("metadata.timeout_secs must be at least 1".to_string()));
        }
        if self.metadata.endpoint.trim().is_empty() {
            return Err(Error::Config("metadata.endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Locates and loads the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the configuration following the priority order above
    pub fn resolve(&self) -> Result<SonglibConfig> {
        if let Some(path) = &self.cli_path {
            info!("Loading config from command-line path: {}", path.display());
            return SonglibConfig::load_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                info!("Loading config from {}: {}", CONFIG_ENV_VAR, path);
                return SonglibConfig::load_file(Path::new(&path));
            }
        }

        match default_config_path() {
            Some(path) if path.exists() => match SonglibConfig::load_file(&path) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    Ok(config)
                }
                Err(e) => {
                    warn!("Ignoring unusable config file {}: {}", path.display(), e);
                    Ok(SonglibConfig::default())
                }
            },
            _ => {
                info!("No config file found, using compiled defaults");
                Ok(SonglibConfig::default())
            }
        }
    }
}

/// `<config dir>/songlib/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songlib").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("songlib").join("songlib.db"))
        .unwrap_or_else(|| PathBuf::from("./songlib_data/songlib.db"))
}
