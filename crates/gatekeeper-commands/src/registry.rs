//! Static command table.

use crate::download::DownloadSource;
use std::fmt::Write;

/// What a command does once it passes the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Welcome text.
    Start,
    /// Command list generated from the registry.
    Help,
    /// Authorization status notice.
    Status,
    /// Current server time.
    Time,
    /// Mock weather report.
    Weather,
    /// Mock bot statistics.
    Stats,
    /// Restricted data dump.
    Secure,
    /// Simulated media download.
    Download(DownloadSource),
}

/// A registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command token, always starting with `/`.
    pub name: &'static str,
    /// One-line description for the help listing.
    pub description: &'static str,
    /// Whether only authorized users may run it.
    pub requires_auth: bool,
    /// Handler selector.
    pub kind: CommandKind,
}

impl Command {
    const fn new(
        name: &'static str,
        description: &'static str,
        requires_auth: bool,
        kind: CommandKind,
    ) -> Self {
        Self {
            name,
            description,
            requires_auth,
            kind,
        }
    }

    /// Whether this is one of the download commands.
    pub fn is_download(&self) -> bool {
        matches!(self.kind, CommandKind::Download(_))
    }
}

const BUILTIN_COMMANDS: [Command; 10] = [
    Command::new("/start", "Start the bot", false, CommandKind::Start),
    Command::new("/help", "Show this help message", false, CommandKind::Help),
    Command::new("/status", "Check your authorization status", false, CommandKind::Status),
    Command::new("/time", "Show current server time", false, CommandKind::Time),
    Command::new("/weather", "Check the weather", true, CommandKind::Weather),
    Command::new("/stats", "View bot statistics", true, CommandKind::Stats),
    Command::new("/secure", "Access secure data", true, CommandKind::Secure),
    Command::new(
        "/youtube",
        "Download from YouTube",
        true,
        CommandKind::Download(DownloadSource::YouTube),
    ),
    Command::new(
        "/instagram",
        "Download from Instagram",
        true,
        CommandKind::Download(DownloadSource::Instagram),
    ),
    Command::new(
        "/tiktok",
        "Download from TikTok",
        true,
        CommandKind::Download(DownloadSource::TikTok),
    ),
];

/// Immutable set of commands, built once at startup.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CommandRegistry {
    /// The built-in Gatekeeper command set.
    pub fn builtin() -> Self {
        Self {
            commands: BUILTIN_COMMANDS.to_vec(),
        }
    }

    /// Finds a command by token; case-insensitive, no prefix matching.
    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Help listing: regular commands first, then the download section.
    pub fn help_text(&self) -> String {
        let mut text = String::from("📋 Available commands:");
        for command in self.iter().filter(|c| !c.is_download()) {
            let _ = write!(text, "\n{} - {}", command.name, command.description);
            if command.requires_auth {
                text.push_str(" (authorized users)");
            }
        }

        let downloads: Vec<&Command> = self.iter().filter(|c| c.is_download()).collect();
        if !downloads.is_empty() {
            text.push_str("\n\n📥 Download Commands:");
            for command in downloads {
                let _ = write!(text, "\n{} [url] - {}", command.name, command.description);
                if command.requires_auth {
                    text.push_str(" (authorized users)");
                }
            }
        }

        text
    }
}
