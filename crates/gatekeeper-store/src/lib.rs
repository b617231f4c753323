//! # Gatekeeper Store
//!
//! Persistence and session state for the Gatekeeper bot.
//!
//! Everything is kept behind a small key/value contract so the backing store
//! (memory, JSON files, or a real database) can be swapped without touching
//! the command layer.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod bots;
pub mod seed;
pub mod session;
pub mod verifier;

pub use backend::{JsonFileStore, JsonStoreExt, KeyValueStore, MemoryStore, BOTS_KEY, SESSION_KEY, USERS_KEY};
pub use bots::{BotConfig, BotRegistry, BotStatus, NewBot};
pub use session::{AuthService, AuthorizationChange};
pub use verifier::{CredentialVerifier, SharedPasswordVerifier};
