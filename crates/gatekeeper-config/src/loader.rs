//! Configuration loading utilities

use crate::schema::{Config, StorageBackend};
use gatekeeper_common::{GatekeeperError, LogFormat};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "GATEKEEPER_CONFIG_PATH";

/// File names probed in the working directory when no path is given.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["gatekeeper.yaml", "gatekeeper.yml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] GatekeeperError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for GatekeeperError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(inner) => inner,
            other => GatekeeperError::config_with_source("Failed to load configuration", other),
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse(&content)?;

        Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate().map_err(ConfigError::ValidationError)?;

        info!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from the usual places.
    ///
    /// Order: explicit path, `GATEKEEPER_CONFIG_PATH`, `gatekeeper.yaml`,
    /// `gatekeeper.yml`, then built-in defaults. Environment overrides and
    /// validation apply in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = Self::locate(explicit) {
            return Self::load_config(path);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Parse YAML text without applying overrides or validation.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GATEKEEPER_TOKEN") {
            config.bot.token = token;
        }

        if let Some(prefix) = lookup("GATEKEEPER_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Some(dir) = lookup("GATEKEEPER_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(backend) = lookup("GATEKEEPER_STORAGE") {
            config.storage.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "file" => StorageBackend::File,
                other => {
                    return Err(ConfigError::EnvParseError {
                        var: "GATEKEEPER_STORAGE".to_string(),
                        source: format!("unknown backend '{other}'").into(),
                    })
                }
            };
        }

        if let Some(password) = lookup("GATEKEEPER_DEMO_PASSWORD") {
            config.auth.demo_password = password;
        }

        if let Some(tick) = lookup("GATEKEEPER_TICK_MS") {
            config.downloads.tick_interval_ms =
                tick.parse().map_err(|e| ConfigError::EnvParseError {
                    var: "GATEKEEPER_TICK_MS".to_string(),
                    source: Box::new(e),
                })?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = lookup("LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.format =
                format
                    .parse::<LogFormat>()
                    .map_err(|e| ConfigError::EnvParseError {
                        var: "LOG_FORMAT".to_string(),
                        source: Box::new(e),
                    })?;
        }

        Ok(())
    }
}
