//! # Gatekeeper Common
//!
//! Shared types, utilities, and common functionality for the Gatekeeper bot.
//!
//! This crate provides the foundational types, the workspace error type and
//! the logging bootstrap used across all other crates in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{GatekeeperError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingGuard};
pub use types::*;
pub use utils::*;
