//! Default values for every configuration section.

use crate::schema::*;
use gatekeeper_common::LoggingConfig;
use std::path::PathBuf;

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotSettings::default(),
            auth: AuthSettings::default(),
            storage: StorageSettings::default(),
            downloads: DownloadSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "/".to_string(),
            typing_delay_ms: 500,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            demo_password: "password".to_string(),
            seed_demo_users: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            min_step: 5,
            max_step: 15,
            single_step_delay_ms: 2500,
        }
    }
}
