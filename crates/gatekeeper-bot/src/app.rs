//! Application wiring.

use crate::error::BotResult;
use gatekeeper_commands::{BuiltinExecutor, CommandHistory, CommandRegistry, Dispatcher};
use gatekeeper_config::{Config, ConfigCache, StorageBackend};
use gatekeeper_store::{
    AuthService, BotRegistry, JsonFileStore, KeyValueStore, MemoryStore, SharedPasswordVerifier,
};
use std::sync::Arc;
use tracing::info;

/// Shared services used by every front end.
#[derive(Debug)]
pub struct App {
    /// Live configuration.
    pub config: Arc<ConfigCache>,
    /// Users and the active session.
    pub auth: Arc<AuthService>,
    /// Configured chat bots.
    pub bots: Arc<BotRegistry>,
    /// Command table.
    pub registry: Arc<CommandRegistry>,
    /// Gate plus built-in handlers.
    pub dispatcher: Arc<Dispatcher<BuiltinExecutor>>,
    /// Commands dispatched by signed-in users.
    pub history: Arc<CommandHistory>,
}

impl App {
    /// Builds the application with the storage backend named in `config`.
    pub fn build(config: Config) -> BotResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(JsonFileStore::open(&config.storage.data_dir)?),
        };
        Self::with_store(config, store)
    }

    /// Builds the application over an explicit store and initializes it.
    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> BotResult<Self> {
        config.validate()?;
        let config = ConfigCache::new(config);
        let current = config.get();

        let verifier = Arc::new(SharedPasswordVerifier::new(current.auth.demo_password.clone()));
        let auth = AuthService::new(store.clone(), verifier)
            .with_seed_demo_users(current.auth.seed_demo_users);
        auth.init()?;

        let bots = BotRegistry::load(store)?;

        let registry = Arc::new(CommandRegistry::builtin());
        let executor = BuiltinExecutor::new(&registry);
        let dispatcher = Dispatcher::new(registry.clone(), executor);

        info!(
            commands = registry.len(),
            backend = ?current.storage.backend,
            "Application initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            bots: Arc::new(bots),
            registry,
            dispatcher: Arc::new(dispatcher),
            history: Arc::new(CommandHistory::new()),
        })
    }

    /// Persists state and releases the session store.
    pub fn shutdown(&self) -> BotResult<()> {
        self.auth.shutdown()?;
        info!("Application shut down");
        Ok(())
    }
}
