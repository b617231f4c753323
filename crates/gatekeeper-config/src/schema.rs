//! Configuration schema definitions using serde.

use gatekeeper_common::{GatekeeperError, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the Gatekeeper bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat adapter configuration.
    pub bot: BotSettings,
    /// Login and seeding configuration.
    pub auth: AuthSettings,
    /// Persistence configuration.
    pub storage: StorageSettings,
    /// Simulated download pacing.
    pub downloads: DownloadSettings,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Chat adapter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Bot token for the chat platform.
    pub token: String,
    /// Leading character sequence that marks a message as a command.
    pub prefix: String,
    /// Delay before a reply is shown in the console, in milliseconds.
    pub typing_delay_ms: u64,
}

/// Login and seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared password accepted by the demo credential verifier.
    pub demo_password: String,
    /// Whether an empty store gets the demo user set.
    pub seed_demo_users: bool,
}

/// Which key/value backend holds users, session and bot configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; nothing survives a restart.
    Memory,
    /// One JSON document per key under `data_dir`.
    #[default]
    File,
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Directory for the file backend.
    pub data_dir: PathBuf,
}

/// Simulated download pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Interval between progress updates, in milliseconds.
    pub tick_interval_ms: u64,
    /// Smallest progress increment per tick, in percentage points.
    pub min_step: u8,
    /// Largest progress increment per tick, in percentage points.
    pub max_step: u8,
    /// Delay before single-step downloads report completion, in milliseconds.
    pub single_step_delay_ms: u64,
}

impl BotSettings {
    /// Console typing delay as a [`Duration`].
    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

impl DownloadSettings {
    /// Tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Single-step completion delay as a [`Duration`].
    pub fn single_step_delay(&self) -> Duration {
        Duration::from_millis(self.single_step_delay_ms)
    }
}

impl Config {
    /// Validates the configuration for local use (console, user management).
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        crate::validator::ConfigValidator::validate(self)
    }

    /// Validates the configuration for connecting to the chat platform.
    pub fn validate_for_chat(&self) -> Result<(), GatekeeperError> {
        self.validate()?;

        if self.bot.token.trim().is_empty() {
            return Err(GatekeeperError::validation_field(
                "Bot token cannot be empty",
                "bot.token",
            ));
        }

        Ok(())
    }
}
