//! # Gatekeeper Config
//!
//! Type-safe configuration management for the Gatekeeper bot.
//!
//! This crate provides configuration loading from YAML with environment
//! overrides, validation, and a lock-free cache for atomic updates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
