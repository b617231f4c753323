//! Application-wide error types using thiserror.

use gatekeeper_common::GatekeeperError;
use gatekeeper_config::ConfigError;
use poise::serenity_prelude as serenity;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Domain or storage error.
    #[error(transparent)]
    Gatekeeper(#[from] GatekeeperError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chat platform error.
    #[error("Chat platform error: {0}")]
    Chat(#[from] Box<serenity::Error>),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        Self::Chat(Box::new(err))
    }
}

impl BotError {
    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Gatekeeper(err) => err.user_message(),
            _ => "❌ Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
