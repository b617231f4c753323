//! # Gatekeeper Bot
//!
//! Binary crate wiring the Gatekeeper command set to its front ends: a chat
//! client built on Poise/Serenity and an interactive local console. Both
//! feed the same [`MessageRouter`], so authorization, history and simulated
//! downloads behave identically regardless of where a message came from.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod chat;
pub mod cli;
pub mod console;
pub mod error;
pub mod router;

pub use app::App;
pub use error::{BotError, BotResult};
pub use router::{ChatSink, InboundMessage, MessageHandle, MessageRouter};
