//! Append-only command history.

use crate::dispatcher::DispatchOutcome;
use chrono::{DateTime, Utc};
use gatekeeper_common::{User, UserId};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// One dispatched command by a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLog {
    /// Unique entry id.
    pub id: Uuid,
    /// When the command was dispatched.
    pub timestamp: DateTime<Utc>,
    /// Who dispatched it.
    pub user_id: UserId,
    /// Username at dispatch time.
    pub username: String,
    /// Command line as the user typed it.
    pub command: String,
    /// Whether the command succeeded.
    pub success: bool,
    /// Reply text.
    pub response: String,
}

/// Which entries [`CommandHistory::entries`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    /// Everything.
    #[default]
    All,
    /// Successful commands only.
    Success,
    /// Failed or rejected commands only.
    Failed,
}

impl HistoryFilter {
    fn matches(self, log: &CommandLog) -> bool {
        match self {
            Self::All => true,
            Self::Success => log.success,
            Self::Failed => !log.success,
        }
    }
}

impl std::str::FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "success" | "ok" => Ok(Self::Success),
            "failed" | "error" => Ok(Self::Failed),
            other => Err(format!("unknown history filter '{other}'")),
        }
    }
}

/// In-memory command log; entries are never changed or removed.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: RwLock<Vec<CommandLog>>,
}

impl CommandHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the outcome of a command dispatched by `user`.
    pub fn record(&self, user: &User, outcome: &DispatchOutcome) -> CommandLog {
        let log = CommandLog {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: user.id,
            username: user.username.clone(),
            command: outcome.command.clone(),
            success: outcome.success,
            response: outcome.text.clone(),
        };

        info!(
            user = %log.username,
            command = %log.command,
            success = log.success,
            "Command executed"
        );

        self.entries.write().push(log.clone());
        log
    }

    /// Matching entries, newest first.
    pub fn entries(&self, filter: HistoryFilter) -> Vec<CommandLog> {
        self.entries
            .read()
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
