//! Live chat adapter built on Poise and Serenity.

use crate::error::{BotError, BotResult};
use crate::router::{ChatSink, InboundMessage, MessageHandle, MessageRouter};
use async_trait::async_trait;
use gatekeeper_common::ChatId;
use poise::serenity_prelude::{self as serenity, GatewayIntents};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared data handed to Poise callbacks.
pub struct Data {
    /// Message router shared with the console.
    pub router: Arc<MessageRouter>,
    /// Prefix marking a message as a command.
    pub prefix: String,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("router", &"<MessageRouter>")
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Error type for Poise callbacks.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// [`ChatSink`] over the Serenity HTTP client.
#[derive(Clone)]
pub struct SerenitySink {
    http: Arc<serenity::Http>,
}

impl SerenitySink {
    /// Wraps a Serenity HTTP client.
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSink for SerenitySink {
    async fn reply(&self, chat_id: ChatId, text: &str) -> BotResult<MessageHandle> {
        let message = serenity::ChannelId::new(chat_id.0)
            .say(&*self.http, text)
            .await?;
        Ok(MessageHandle(message.id.get()))
    }

    async fn edit(&self, chat_id: ChatId, handle: MessageHandle, text: &str) -> BotResult<()> {
        serenity::ChannelId::new(chat_id.0)
            .edit_message(
                &*self.http,
                serenity::MessageId::new(handle.0),
                serenity::EditMessage::new().content(text),
            )
            .await?;
        Ok(())
    }
}

/// Turns `prefix`-marked text into the `/command` form the registry uses.
pub fn normalize_command(text: &str, prefix: &str) -> Option<String> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(format!("/{rest}"))
}

/// Global error handler for the framework
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                "Error in event handler for {:?}: {:?}",
                event.snake_case_name(),
                error
            );
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Central event handler for chat events
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Bot ready event received for: {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            if new_message.author.bot {
                return Ok(());
            }

            let Some(text) = normalize_command(&new_message.content, &data.prefix) else {
                return Ok(());
            };

            let inbound = InboundMessage {
                chat_id: ChatId(new_message.channel_id.get()),
                text,
                from: Some(new_message.author.name.clone()),
            };
            debug!(chat_id = %inbound.chat_id, from = ?inbound.from, "Inbound command");

            // Downloads run for seconds; keep the gateway responsive.
            let router = data.router.clone();
            let sink = SerenitySink::new(ctx.http.clone());
            tokio::spawn(async move {
                if let Err(e) = router.handle(&sink, &inbound).await {
                    error!(chat_id = %inbound.chat_id, error = %e, "Failed to handle message");
                }
            });
        }
        _ => {}
    }
    Ok(())
}

/// Connects to the chat platform and serves commands until Ctrl-C.
pub async fn run(router: Arc<MessageRouter>) -> BotResult<()> {
    let config = router.app().config.get();
    config.validate_for_chat()?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let prefix = config.bot.prefix.clone();
    let setup_router = router.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("Bot connected as: {}", ready.user.name);
                Ok(Data {
                    router: setup_router,
                    prefix,
                })
            })
        })
        .build();

    info!("Poise framework configured");

    let mut client = serenity::ClientBuilder::new(&config.bot.token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    let shutdown_router = router.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {:?}", e);
            return;
        }

        info!("Received shutdown signal, starting graceful shutdown");
        let stopped = shutdown_router.stop_all();
        info!(stopped, "Stopped running downloads");

        shard_manager.shutdown_all().await;
    });

    info!("Gatekeeper bot is starting up...");

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
        return Err(BotError::from(why));
    }

    info!("Gatekeeper bot has shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("/time", "/").as_deref(), Some("/time"));
        assert_eq!(
            normalize_command("!weather London", "!").as_deref(),
            Some("/weather London")
        );
        assert_eq!(normalize_command("hello", "/"), None);
        assert_eq!(normalize_command("/", "/"), None);
        assert_eq!(normalize_command("! time", "!"), None);
    }
}
