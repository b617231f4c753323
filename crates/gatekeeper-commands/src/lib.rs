//! # Gatekeeper Commands
//!
//! The command set of the Gatekeeper bot and the gate in front of it.
//!
//! A raw input line goes through [`Dispatcher::dispatch`], which looks the
//! command up in the [`CommandRegistry`], refuses restricted commands for
//! unauthorized users before any handler runs, and turns every failure into
//! a fixed user-facing text. Download commands additionally hand back a
//! [`DownloadRequest`] that front ends turn into a [`DownloadSimulation`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatcher;
pub mod download;
pub mod handlers;
pub mod history;
pub mod registry;

pub use dispatcher::{parse_input, DispatchError, DispatchOutcome, Dispatcher};
pub use download::{
    render_progress_bar, DownloadRequest, DownloadSimulation, DownloadSource, ProgressEvent,
    ProgressSequence, SimulationSettings, StepPolicy, StopHandle,
};
pub use handlers::{BuiltinExecutor, CommandExecutor, HandlerError, Reply};
pub use history::{CommandHistory, CommandLog, HistoryFilter};
pub use registry::{Command, CommandKind, CommandRegistry};
