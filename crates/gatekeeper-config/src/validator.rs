//! Runtime validation of a loaded configuration.

use crate::schema::{Config, StorageBackend};
use gatekeeper_common::{GatekeeperError, Result};

/// Tick intervals outside this range make the simulation useless.
const TICK_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=10_000;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if config.bot.prefix.trim().is_empty() {
            return Err(GatekeeperError::validation_field(
                "Command prefix cannot be empty",
                "bot.prefix",
            ));
        }

        if config.auth.demo_password.is_empty() {
            return Err(GatekeeperError::validation_field(
                "Demo password cannot be empty",
                "auth.demo_password",
            ));
        }

        if config.storage.backend == StorageBackend::File
            && config.storage.data_dir.as_os_str().is_empty()
        {
            return Err(GatekeeperError::validation_field(
                "Data directory is required for the file backend",
                "storage.data_dir",
            ));
        }

        let downloads = &config.downloads;
        if !TICK_INTERVAL_RANGE_MS.contains(&downloads.tick_interval_ms) {
            return Err(GatekeeperError::validation_field(
                format!(
                    "Tick interval must be between {} and {} ms",
                    TICK_INTERVAL_RANGE_MS.start(),
                    TICK_INTERVAL_RANGE_MS.end()
                ),
                "downloads.tick_interval_ms",
            ));
        }

        if downloads.min_step == 0 || downloads.min_step > downloads.max_step {
            return Err(GatekeeperError::validation_field(
                "Progress steps must satisfy 1 <= min_step <= max_step",
                "downloads.min_step",
            ));
        }

        if downloads.max_step > 100 {
            return Err(GatekeeperError::validation_field(
                "Progress step cannot exceed 100",
                "downloads.max_step",
            ));
        }

        if config.logging.level.trim().is_empty() {
            return Err(GatekeeperError::validation_field(
                "Log level cannot be empty",
                "logging.level",
            ));
        }

        Ok(())
    }
}
