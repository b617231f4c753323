//! Integration tests for the gatekeeper-bot crate.
//!
//! These drive the application through its front ends over a file-backed
//! store, the way the binary wires it.

use async_trait::async_trait;
use gatekeeper_bot::console::{Console, ConsoleSink};
use gatekeeper_bot::{App, BotResult, ChatSink, InboundMessage, MessageHandle, MessageRouter};
use gatekeeper_common::test_utils::init_test_logging;
use gatekeeper_common::{ChatId, UserId};
use gatekeeper_config::{Config, StorageBackend};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Sink that records every message it is asked to send or edit.
#[derive(Default)]
struct RecordingSink {
    replies: Mutex<Vec<(ChatId, String)>>,
    edits: Mutex<Vec<(MessageHandle, String)>>,
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn reply(&self, chat_id: ChatId, text: &str) -> BotResult<MessageHandle> {
        let mut replies = self.replies.lock();
        replies.push((chat_id, text.to_string()));
        Ok(MessageHandle(replies.len() as u64))
    }

    async fn edit(&self, _chat_id: ChatId, handle: MessageHandle, text: &str) -> BotResult<()> {
        self.edits.lock().push((handle, text.to_string()));
        Ok(())
    }
}

impl RecordingSink {
    fn reply_texts(&self) -> Vec<String> {
        self.replies.lock().iter().map(|(_, text)| text.clone()).collect()
    }
}

fn file_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::File;
    config.storage.data_dir = dir.to_path_buf();
    config.downloads.tick_interval_ms = 50;
    config.downloads.single_step_delay_ms = 10;
    config
}

fn inbound(text: &str, from: &str) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(42),
        text: text.to_string(),
        from: Some(from.to_string()),
    }
}

async fn run_console(app: Arc<App>, script: &str) -> String {
    let console = Console::new(Arc::new(MessageRouter::new(app)));
    let sink = ConsoleSink::new(Vec::new(), Duration::ZERO);
    console.run(script.as_bytes(), &sink).await.unwrap();
    String::from_utf8(sink.into_inner()).unwrap()
}

#[tokio::test]
async fn test_chat_senders_are_gated_by_stored_authorization() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let router = MessageRouter::new(app.clone());
    let sink = RecordingSink::default();

    let allowed = router.handle(&sink, &inbound("/secure", "user1")).await.unwrap();
    let denied = router.handle(&sink, &inbound("/secure", "user2")).await.unwrap();
    let public = router.handle(&sink, &inbound("/start", "nobody")).await.unwrap();

    assert!(allowed.success);
    assert!(!denied.success);
    assert!(public.success);

    let replies = sink.replies.lock().clone();
    assert_eq!(replies.len(), 3);
    assert!(replies.iter().all(|(chat, _)| *chat == ChatId(42)));
    assert!(replies[1].1.contains("Access denied"));

    // Only the two known senders are recorded.
    assert_eq!(app.history.len(), 2);
}

#[tokio::test]
async fn test_authorization_change_takes_effect_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let router = MessageRouter::new(app.clone());
    let sink = RecordingSink::default();

    let before = router.handle(&sink, &inbound("/stats", "user2")).await.unwrap();
    assert!(!before.success);

    let admin = app.auth.verify_credentials("admin@example.com", "password").unwrap();
    app.auth.authorize_by(&admin, UserId(3)).unwrap();

    let after = router.handle(&sink, &inbound("/stats", "user2")).await.unwrap();
    assert!(after.success);
}

#[tokio::test]
async fn test_download_over_chat_edits_one_progress_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let router = MessageRouter::new(app);
    let sink = RecordingSink::default();

    let outcome = router
        .handle(&sink, &inbound("/youtube https://youtu.be/abc", "admin"))
        .await
        .unwrap();
    assert!(outcome.success);

    let replies = sink.reply_texts();
    assert_eq!(replies.len(), 3);
    assert!(replies[0].starts_with("🎥 Processing YouTube download: https://youtu.be/abc"));
    assert_eq!(replies[1], "📥 Starting download...");
    assert!(replies[2].contains("https://youtu.be/abc"));

    let edits = sink.edits.lock().clone();
    assert!(!edits.is_empty());
    assert!(edits.iter().all(|(handle, _)| *handle == MessageHandle(2)));
    assert_eq!(edits.last().unwrap().1, "✅ Download complete!");
    assert_eq!(router.active_downloads(), 0);
}

#[tokio::test]
async fn test_console_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let output = run_console(
        app.clone(),
        ":register carol carol@example.com hunter22\n/secure\n:quit\n",
    )
    .await;
    assert!(output.contains("Registered and signed in as @carol (Unauthorized)"));
    assert!(output.contains("Access denied"));
    app.shutdown().unwrap();

    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let carol = app.auth.current_user().expect("session restored");
    assert_eq!(carol.username, "carol");
    assert_eq!(carol.id, UserId(4));
    assert!(!carol.is_authorized);
    assert_eq!(app.auth.users().len(), 4);
}

#[tokio::test]
async fn test_console_admin_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(App::build(file_config(dir.path())).unwrap());

    let output = run_console(
        app.clone(),
        ":login user1@example.com password\n\
         :authorize 3\n\
         :logout\n\
         :login admin@example.com password\n\
         :authorize 3\n\
         :whoami\n",
    )
    .await;

    assert!(output.contains("⛔ Only admins can change authorization."));
    assert!(output.contains("✅ Updated: @user2 (Authorized)"));
    assert!(output.contains("#1 @admin (Authorized) [admin] <admin@example.com>"));
    assert!(app.auth.find_user(UserId(3)).unwrap().is_authorized);
}

#[tokio::test]
async fn test_console_reads_until_quit() {
    let dir = tempfile::tempdir().unwrap();
    let app = Arc::new(App::build(file_config(dir.path())).unwrap());
    let console = Console::new(Arc::new(MessageRouter::new(app.clone())));
    let sink = ConsoleSink::new(Vec::new(), Duration::ZERO);

    // Lines after :quit are never read.
    let stdin = tokio_test::io::Builder::new()
        .read(b"/start\n")
        .read(b":quit\n")
        .build();
    console
        .run(tokio::io::BufReader::new(stdin), &sink)
        .await
        .unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert!(output.starts_with("🤖 Gatekeeper console. Not signed in."));
    assert!(output.contains("Welcome"));
    assert!(app.history.is_empty());
}

#[tokio::test]
async fn test_bot_registry_persists_across_restart() {
    let dir = tempfile::tempdir().unwrap();

    let app = App::build(file_config(dir.path())).unwrap();
    let bot = app
        .bots
        .add(gatekeeper_store::NewBot {
            name: "Support".to_string(),
            api_key: "key-123".to_string(),
            description: String::new(),
        })
        .unwrap();
    app.shutdown().unwrap();

    let app = App::build(file_config(dir.path())).unwrap();
    let bots = app.bots.list();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].id, bot.id);
    assert_eq!(bots[0].name, "Support");
}
