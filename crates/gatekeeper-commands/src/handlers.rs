//! Command handlers.
//!
//! Handlers are canned text templates and random mock figures; the only
//! side effect a handler can request is a simulated download.

use crate::download::{DownloadRequest, DownloadSource};
use crate::registry::{CommandKind, CommandRegistry};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const WEATHER_LOCATIONS: [&str; 5] = ["New York", "London", "Tokyo", "Sydney", "Moscow"];
const WEATHER_CONDITIONS: [&str; 5] = ["Sunny", "Cloudy", "Rainy", "Snowy", "Partly cloudy"];
const WEATHER_TEMPERATURES: [i8; 9] = [12, 18, 25, 30, 5, -2, 8, 15, 22];

const SECURE_DATA: [&str; 6] = [
    "Project Neptune launch codes: 45XFT-789-ALPHA",
    "Encrypted channel access: SECURED",
    "Database connection: ESTABLISHED",
    "Security clearance: LEVEL 4",
    "System integrity: 99.7%",
    "Protected resources: ACCESSIBLE",
];

/// Handler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text shown to the user.
    pub text: String,
    /// `false` for soft failures such as a missing argument.
    pub success: bool,
    /// Download to simulate after the reply is sent.
    pub download: Option<DownloadRequest>,
}

impl Reply {
    /// Successful plain-text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            download: None,
        }
    }

    /// Unsuccessful reply that still has a user-facing explanation.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
            download: None,
        }
    }

    /// Successful reply that starts a download.
    pub fn with_download(text: impl Into<String>, request: DownloadRequest) -> Self {
        Self {
            text: text.into(),
            success: true,
            download: Some(request),
        }
    }
}

/// Handler failures; the dispatcher hides the details from users.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler could not produce a reply.
    #[error("handler failed: {message}")]
    Failed {
        /// Diagnostic message for logs.
        message: String,
    },
}

impl HandlerError {
    /// Creates a generic handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Executes a command that already passed the authorization gate.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor: Send + Sync {
    /// Runs `kind` with the whitespace-normalized parameter string.
    fn execute(&self, kind: CommandKind, params: &str) -> Result<Reply, HandlerError>;
}

/// The built-in handlers.
#[derive(Debug)]
pub struct BuiltinExecutor {
    help: String,
    rng: Mutex<StdRng>,
}

impl BuiltinExecutor {
    /// Creates the executor; the help text is generated from `registry`.
    pub fn new(registry: &CommandRegistry) -> Self {
        Self::with_rng(registry, StdRng::from_os_rng())
    }

    /// Executor with reproducible mock data.
    pub fn seeded(registry: &CommandRegistry, seed: u64) -> Self {
        Self::with_rng(registry, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: &CommandRegistry, rng: StdRng) -> Self {
        Self {
            help: registry.help_text(),
            rng: Mutex::new(rng),
        }
    }

    fn weather(&self, params: &str) -> String {
        let mut rng = self.rng.lock();
        let location = if params.is_empty() {
            WEATHER_LOCATIONS.choose(&mut *rng).copied().unwrap_or("New York")
        } else {
            params
        };
        let condition = WEATHER_CONDITIONS.choose(&mut *rng).copied().unwrap_or("Sunny");
        let temperature = WEATHER_TEMPERATURES.choose(&mut *rng).copied().unwrap_or(18);
        let humidity: u8 = rng.random_range(0..100);

        format!(
            "🌤 Weather for {location}:\nCondition: {condition}\nTemperature: {temperature}°C\nHumidity: {humidity}%"
        )
    }

    fn stats(&self) -> String {
        let mut rng = self.rng.lock();
        let users: u32 = rng.random_range(500..1500);
        let commands: u32 = rng.random_range(2000..12000);
        let uptime: u32 = rng.random_range(24..744);
        let load: u32 = rng.random_range(10..90);

        format!(
            "📊 Bot Statistics:\nTotal users: {users}\nCommands processed: {commands}\nUptime: {uptime} hours\nServer load: {load}%"
        )
    }

    fn download(source: DownloadSource, params: &str) -> Reply {
        match params.split_whitespace().next() {
            Some(url) => Reply::with_download(
                source.processing_text(url),
                DownloadRequest::new(source, url),
            ),
            None => Reply::warning(source.usage_warning()),
        }
    }
}

impl CommandExecutor for BuiltinExecutor {
    fn execute(&self, kind: CommandKind, params: &str) -> Result<Reply, HandlerError> {
        let reply = match kind {
            CommandKind::Start => Reply::text(
                "👋 Welcome to the Gatekeeper Bot! Type /help to see available commands.",
            ),
            CommandKind::Help => Reply::text(self.help.clone()),
            CommandKind::Status => Reply::text("🔄 Checking your authorization status..."),
            CommandKind::Time => Reply::text(format!(
                "🕒 Current server time: {}",
                chrono::Local::now().format("%H:%M:%S")
            )),
            CommandKind::Weather => Reply::text(self.weather(params)),
            CommandKind::Stats => Reply::text(self.stats()),
            CommandKind::Secure => Reply::text(format!(
                "🔐 SECURE DATA ACCESS GRANTED\n\n{}",
                SECURE_DATA.join("\n")
            )),
            CommandKind::Download(source) => Self::download(source, params),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> BuiltinExecutor {
        BuiltinExecutor::seeded(&CommandRegistry::builtin(), 42)
    }

    #[test]
    fn test_weather_uses_requested_location() {
        let reply = executor().execute(CommandKind::Weather, "Tokyo").unwrap();

        assert!(reply.success);
        assert!(reply.text.starts_with("🌤 Weather for Tokyo:\nCondition: "));
        assert!(reply.text.contains("°C\nHumidity: "));
    }

    #[test]
    fn test_weather_random_location() {
        let reply = executor().execute(CommandKind::Weather, "").unwrap();

        assert!(WEATHER_LOCATIONS
            .iter()
            .any(|city| reply.text.starts_with(&format!("🌤 Weather for {city}:"))));
    }

    #[test]
    fn test_stats_figures_in_range() {
        let reply = executor().execute(CommandKind::Stats, "").unwrap();
        let users: u32 = reply
            .text
            .lines()
            .find_map(|l| l.strip_prefix("Total users: "))
            .and_then(|v| v.parse().ok())
            .unwrap();

        assert!((500..1500).contains(&users));
        assert!(reply.text.starts_with("📊 Bot Statistics:"));
    }

    #[test]
    fn test_secure_lines() {
        let reply = executor().execute(CommandKind::Secure, "").unwrap();

        assert!(reply.text.starts_with("🔐 SECURE DATA ACCESS GRANTED\n\n"));
        assert!(reply.text.ends_with("Protected resources: ACCESSIBLE"));
    }

    #[test]
    fn test_download_with_and_without_url() {
        let executor = executor();

        let missing = executor
            .execute(CommandKind::Download(DownloadSource::TikTok), "")
            .unwrap();
        assert!(!missing.success);
        assert!(missing.download.is_none());

        let accepted = executor
            .execute(
                CommandKind::Download(DownloadSource::YouTube),
                "https://youtu.be/abc extra words",
            )
            .unwrap();
        assert!(accepted.success);
        assert_eq!(
            accepted.download,
            Some(DownloadRequest::new(DownloadSource::YouTube, "https://youtu.be/abc"))
        );
        assert_eq!(accepted.text, "🎥 Processing YouTube download: https://youtu.be/abc");
    }

    #[test]
    fn test_help_comes_from_registry() {
        let registry = CommandRegistry::builtin();
        let reply = executor().execute(CommandKind::Help, "").unwrap();

        assert_eq!(reply.text, registry.help_text());
    }
}
