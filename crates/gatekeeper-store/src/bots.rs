//! Registry of configured chat bots.

use crate::backend::{JsonStoreExt, KeyValueStore, BOTS_KEY};
use chrono::{DateTime, Utc};
use gatekeeper_common::{GatekeeperError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Whether a bot is in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    /// Accepting commands.
    Active,
    /// Configured but switched off.
    #[default]
    Inactive,
}

impl BotStatus {
    /// Parses a stored status; anything unrecognized is inactive.
    pub fn normalize(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BotStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::normalize).unwrap_or_default())
    }
}

/// A configured bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Generated identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Platform API key.
    pub api_key: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Service status.
    #[serde(default)]
    pub status: BotStatus,
    /// When the bot was added.
    pub date_added: DateTime<Utc>,
}

/// Fields supplied when adding a bot.
#[derive(Debug, Clone, Default)]
pub struct NewBot {
    /// Display name (required).
    pub name: String,
    /// Platform API key (required).
    pub api_key: String,
    /// Optional description.
    pub description: String,
}

/// Persisted list of [`BotConfig`]s.
#[derive(Debug)]
pub struct BotRegistry {
    store: Arc<dyn KeyValueStore>,
    bots: RwLock<Vec<BotConfig>>,
}

impl BotRegistry {
    /// Loads the bot list from `store`; a missing list is empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let bots = store.load_json::<Vec<BotConfig>>(BOTS_KEY)?.unwrap_or_default();
        info!(count = bots.len(), "Loaded bot registry");

        Ok(Self {
            store,
            bots: RwLock::new(bots),
        })
    }

    /// Snapshot of all bots in insertion order.
    pub fn list(&self) -> Vec<BotConfig> {
        self.bots.read().clone()
    }

    /// Looks up a bot by id.
    pub fn get(&self, id: &str) -> Option<BotConfig> {
        self.bots.read().iter().find(|b| b.id == id).cloned()
    }

    /// Adds an active bot.
    pub fn add(&self, new_bot: NewBot) -> Result<BotConfig> {
        let name = new_bot.name.trim();
        let api_key = new_bot.api_key.trim();
        if name.is_empty() || api_key.is_empty() {
            return Err(GatekeeperError::validation(
                "Bot name and API key are required",
            ));
        }

        let bot = BotConfig {
            id: format!("bot-{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            api_key: api_key.to_string(),
            description: new_bot.description.trim().to_string(),
            status: BotStatus::Active,
            date_added: Utc::now(),
        };

        let mut bots = self.bots.write();
        let mut next = bots.clone();
        next.push(bot.clone());
        self.store.store_json(BOTS_KEY, &next)?;
        *bots = next;

        info!(id = %bot.id, name = %bot.name, "Bot added");
        Ok(bot)
    }

    /// Removes a bot; returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut bots = self.bots.write();
        let next: Vec<BotConfig> = bots.iter().filter(|b| b.id != id).cloned().collect();
        if next.len() == bots.len() {
            warn!(id, "Bot not found");
            return Ok(false);
        }

        self.store.store_json(BOTS_KEY, &next)?;
        *bots = next;
        info!(id, "Bot removed");
        Ok(true)
    }

    /// Sets a bot's status; returns whether it existed.
    pub fn set_status(&self, id: &str, status: BotStatus) -> Result<bool> {
        let mut bots = self.bots.write();
        let Some(index) = bots.iter().position(|b| b.id == id) else {
            warn!(id, "Bot not found");
            return Ok(false);
        };

        let mut next = bots.clone();
        next[index].status = status;
        self.store.store_json(BOTS_KEY, &next)?;
        *bots = next;

        info!(id, %status, "Bot status changed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn registry() -> (Arc<MemoryStore>, BotRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = BotRegistry::load(store.clone()).unwrap();
        (store, registry)
    }

    #[test]
    fn test_status_normalization() {
        assert_eq!(BotStatus::normalize("active"), BotStatus::Active);
        assert_eq!(BotStatus::normalize(" ACTIVE "), BotStatus::Active);
        assert_eq!(BotStatus::normalize("paused"), BotStatus::Inactive);
        assert_eq!(BotStatus::normalize(""), BotStatus::Inactive);
    }

    #[test]
    fn test_unknown_stored_status_loads_inactive() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                BOTS_KEY,
                r#"[{"id":"bot-1","name":"Legacy","apiKey":"k","status":"suspended","dateAdded":"2024-01-01T00:00:00Z"},
                    {"id":"bot-2","name":"Bare","apiKey":"k","status":null,"dateAdded":"2024-01-01T00:00:00Z"}]"#,
            )
            .unwrap();

        let registry = BotRegistry::load(store).unwrap();
        let bots = registry.list();
        assert_eq!(bots[0].status, BotStatus::Inactive);
        assert_eq!(bots[1].status, BotStatus::Inactive);
        assert_eq!(bots[0].description, "");
    }

    #[test]
    fn test_add_requires_name_and_key() {
        let (_, registry) = registry();

        let err = registry
            .add(NewBot {
                name: "  ".into(),
                api_key: "key".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GatekeeperError::Validation { .. }));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_add_persists_active_bot() {
        let (store, registry) = registry();

        let bot = registry
            .add(NewBot {
                name: "Helper".into(),
                api_key: "123:abc".into(),
                description: "Answers questions".into(),
            })
            .unwrap();

        assert!(bot.id.starts_with("bot-"));
        assert_eq!(bot.status, BotStatus::Active);

        let reloaded = BotRegistry::load(store).unwrap();
        assert_eq!(reloaded.list(), vec![bot]);
    }

    #[test]
    fn test_status_and_removal() {
        let (_, registry) = registry();
        let bot = registry
            .add(NewBot {
                name: "Helper".into(),
                api_key: "k".into(),
                ..Default::default()
            })
            .unwrap();

        assert!(registry.set_status(&bot.id, BotStatus::Inactive).unwrap());
        assert_eq!(registry.get(&bot.id).unwrap().status, BotStatus::Inactive);
        assert!(!registry.set_status("bot-missing", BotStatus::Active).unwrap());

        assert!(registry.remove(&bot.id).unwrap());
        assert!(!registry.remove(&bot.id).unwrap());
        assert!(registry.list().is_empty());
    }
}
