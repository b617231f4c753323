//! Front-end independent message handling.
//!
//! The router resolves who sent a message, runs it through the dispatcher,
//! records it, replies, and drives any simulated download by editing a
//! single progress message. Front ends only implement [`ChatSink`].

use crate::app::App;
use crate::error::BotResult;
use async_trait::async_trait;
use futures::StreamExt;
use gatekeeper_commands::download::STARTING_TEXT;
use gatekeeper_commands::{
    DispatchOutcome, DownloadRequest, DownloadSimulation, ProgressEvent, SimulationSettings,
    StopHandle,
};
use gatekeeper_common::{ChatId, User};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opaque reference to a sent message, used for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

/// A text message received from a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Conversation the message belongs to.
    pub chat_id: ChatId,
    /// Raw text, already normalized to the `/command` form.
    pub text: String,
    /// Platform username of the sender, if known.
    pub from: Option<String>,
}

/// Outbound side of a front end.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Sends a new message and returns its handle.
    async fn reply(&self, chat_id: ChatId, text: &str) -> BotResult<MessageHandle>;

    /// Replaces the text of a previously sent message.
    async fn edit(&self, chat_id: ChatId, handle: MessageHandle, text: &str) -> BotResult<()>;
}

/// Routes inbound text to the dispatcher and renders the outcome.
#[derive(Debug)]
pub struct MessageRouter {
    app: Arc<App>,
    next_download: AtomicU64,
    downloads: Mutex<HashMap<u64, (ChatId, StopHandle)>>,
}

impl MessageRouter {
    /// Creates a router over the shared application services.
    pub fn new(app: Arc<App>) -> Self {
        Self {
            app,
            next_download: AtomicU64::new(1),
            downloads: Mutex::new(HashMap::new()),
        }
    }

    /// The application services.
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Stored user linked to a platform username.
    ///
    /// The platform name is trusted as-is: any account whose display name
    /// matches a stored username acts with that user's authorization. Only
    /// run the chat adapter where platform names are controlled.
    pub fn resolve_sender(&self, message: &InboundMessage) -> Option<User> {
        message
            .from
            .as_deref()
            .and_then(|name| self.app.auth.find_by_username(name))
    }

    /// Handles a message from the chat platform; unknown senders are
    /// treated as signed out.
    pub async fn handle(
        &self,
        sink: &dyn ChatSink,
        message: &InboundMessage,
    ) -> BotResult<DispatchOutcome> {
        let user = self.resolve_sender(message);
        self.handle_as(sink, message.chat_id, &message.text, user.as_ref())
            .await
    }

    /// Handles `text` on behalf of `user`, returning once any simulated
    /// download has finished or was stopped.
    pub async fn handle_as(
        &self,
        sink: &dyn ChatSink,
        chat_id: ChatId,
        text: &str,
        user: Option<&User>,
    ) -> BotResult<DispatchOutcome> {
        let outcome = self.app.dispatcher.dispatch(text, user);

        if let Some(user) = user {
            self.app.history.record(user, &outcome);
        }

        sink.reply(chat_id, &outcome.text).await?;

        if let Some(request) = outcome.download.clone() {
            self.run_download(sink, chat_id, request).await?;
        }

        Ok(outcome)
    }

    async fn run_download(
        &self,
        sink: &dyn ChatSink,
        chat_id: ChatId,
        request: DownloadRequest,
    ) -> BotResult<()> {
        let settings = SimulationSettings::from(&self.app.config.get().downloads);
        let simulation = DownloadSimulation::new(request, settings);

        let id = self.next_download.fetch_add(1, Ordering::Relaxed);
        self.downloads
            .lock()
            .insert(id, (chat_id, simulation.stop_handle()));

        let result = self.render_download(sink, chat_id, simulation).await;
        self.downloads.lock().remove(&id);
        result
    }

    async fn render_download(
        &self,
        sink: &dyn ChatSink,
        chat_id: ChatId,
        simulation: DownloadSimulation,
    ) -> BotResult<()> {
        let progress = if simulation.request().source.has_progress_bar() {
            Some(sink.reply(chat_id, STARTING_TEXT).await?)
        } else {
            None
        };

        let mut events = simulation.into_stream();
        while let Some(event) = events.next().await {
            let terminal = event.is_terminal();
            match event {
                ProgressEvent::Progress { percent, text } => {
                    if let Some(handle) = progress {
                        // A failed edit only loses one frame.
                        if let Err(e) = sink.edit(chat_id, handle, &text).await {
                            warn!(%chat_id, percent, error = %e, "Failed to update progress");
                        }
                    }
                }
                ProgressEvent::Complete { text, summary } => {
                    if let Some(handle) = progress {
                        sink.edit(chat_id, handle, &text).await?;
                    }
                    sink.reply(chat_id, &summary).await?;
                }
                ProgressEvent::Stopped { percent } => {
                    info!(%chat_id, ?percent, "Download stopped before completion");
                }
            }
            if terminal {
                break;
            }
        }

        Ok(())
    }

    /// Stops every running download; returns how many were running.
    pub fn stop_all(&self) -> usize {
        let downloads = self.downloads.lock();
        for (chat_id, handle) in downloads.values() {
            debug!(%chat_id, "Stopping download");
            handle.stop();
        }
        downloads.len()
    }

    /// Number of downloads currently running.
    pub fn active_downloads(&self) -> usize {
        self.downloads.lock().len()
    }
}
