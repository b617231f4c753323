//! Interactive local console.
//!
//! Lines starting with `/` go through the same router as chat messages,
//! signed in as the persisted session user. Lines starting with `:` manage
//! the session and users. Each line is handled to completion, simulated
//! downloads included, before the next one is read.

use crate::error::BotResult;
use crate::router::{ChatSink, MessageHandle, MessageRouter};
use async_trait::async_trait;
use gatekeeper_commands::HistoryFilter;
use gatekeeper_common::{format_timestamp, truncate_string, ChatId, User, UserId};
use gatekeeper_store::AuthorizationChange;
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

/// Longest reply excerpt shown by `:history full`.
const HISTORY_EXCERPT_CHARS: usize = 80;

/// Chat id used for the local console.
pub const CONSOLE_CHAT: ChatId = ChatId(0);

const CONSOLE_HELP: &str = "\
Console commands:
:login <email> <password>           sign in
:register <username> <email> <pw>   create an account and sign in
:logout                             sign out
:whoami                             show the signed-in user
:users                              list users
:authorize <id> / :deauthorize <id> change access (admins only)
:history [all|success|failed] [full] show your command history
:bots                               list configured bots
:quit                               leave the console
Anything starting with / is sent to the bot (try /help).";

/// Whether the console keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop reading.
    Quit,
}

/// [`ChatSink`] printing to a writer. Edits are printed as new lines tagged
/// with the message they replace.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: Mutex<W>,
    next_id: AtomicU64,
    typing_delay: Duration,
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Creates a sink that waits `typing_delay` before every reply.
    pub fn new(out: W, typing_delay: Duration) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(1),
            typing_delay,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> ChatSink for ConsoleSink<W> {
    async fn reply(&self, _chat_id: ChatId, text: &str) -> BotResult<MessageHandle> {
        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut out = self.out.lock();
        writeln!(out, "🤖 {text}")?;
        out.flush()?;
        Ok(MessageHandle(id))
    }

    async fn edit(&self, _chat_id: ChatId, handle: MessageHandle, text: &str) -> BotResult<()> {
        let mut out = self.out.lock();
        writeln!(out, "   [#{}] {text}", handle.0)?;
        out.flush()?;
        Ok(())
    }
}

/// Line-oriented front end over a [`MessageRouter`].
#[derive(Debug)]
pub struct Console {
    router: Arc<MessageRouter>,
}

impl Console {
    /// Creates a console over `router`.
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }

    /// Reads lines from `input` until EOF or `:quit`.
    pub async fn run<R>(&self, input: R, sink: &dyn ChatSink) -> BotResult<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let greeting = match self.router.app().auth.current_user() {
            Some(user) => format!("Gatekeeper console. Signed in as {user}. Type :help for help."),
            None => "Gatekeeper console. Not signed in. Type :help for help.".to_string(),
        };
        sink.reply(CONSOLE_CHAT, &greeting).await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if self.handle_line(&line, sink).await? == Flow::Quit {
                break;
            }
        }

        info!("Console session ended");
        Ok(())
    }

    /// Handles one input line.
    pub async fn handle_line(&self, line: &str, sink: &dyn ChatSink) -> BotResult<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let Some(meta) = line.strip_prefix(':') else {
            let user = self.router.app().auth.current_user();
            self.router
                .handle_as(sink, CONSOLE_CHAT, line, user.as_ref())
                .await?;
            return Ok(Flow::Continue);
        };

        let mut args = meta.split_whitespace();
        let command = args.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = args.collect();
        debug!(command = %command, "Console command");

        let response = match command.as_str() {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "h" => CONSOLE_HELP.to_string(),
            "login" => self.login(&args),
            "register" => self.register(&args),
            "logout" => self.logout(),
            "whoami" => self.whoami(),
            "users" => self.users(),
            "authorize" => self.change_authorization(&args, true),
            "deauthorize" => self.change_authorization(&args, false),
            "history" => self.history(&args),
            "bots" => self.bots(),
            other => format!("⚠️ Unknown console command ':{other}'. Type :help for help."),
        };

        sink.reply(CONSOLE_CHAT, &response).await?;
        Ok(Flow::Continue)
    }

    fn login(&self, args: &[&str]) -> String {
        let [email, password] = args else {
            return "⚠️ Usage: :login <email> <password>".to_string();
        };
        match self.router.app().auth.login(email, password) {
            Ok(user) => format!("✅ Signed in as {user}"),
            Err(e) => e.user_message(),
        }
    }

    fn register(&self, args: &[&str]) -> String {
        let [username, email, password] = args else {
            return "⚠️ Usage: :register <username> <email> <password>".to_string();
        };
        match self.router.app().auth.register(username, email, password) {
            Ok(user) => format!(
                "✅ Registered and signed in as {user}. An admin must authorize you before restricted commands work."
            ),
            Err(e) => e.user_message(),
        }
    }

    fn logout(&self) -> String {
        let auth = &self.router.app().auth;
        if auth.current_user().is_none() {
            return "ℹ️ Not signed in.".to_string();
        }
        match auth.logout() {
            Ok(()) => "👋 Signed out.".to_string(),
            Err(e) => e.user_message(),
        }
    }

    fn whoami(&self) -> String {
        match self.router.app().auth.current_user() {
            Some(user) => format!("👤 {}", user_line(&user)),
            None => "ℹ️ Not signed in.".to_string(),
        }
    }

    fn users(&self) -> String {
        let mut text = String::from("👥 Users:");
        for user in self.router.app().auth.users() {
            let _ = write!(text, "\n{}", user_line(&user));
        }
        text
    }

    fn change_authorization(&self, args: &[&str], authorize: bool) -> String {
        let auth = &self.router.app().auth;
        let Some(actor) = auth.current_user() else {
            return "⚠️ Sign in as an admin first.".to_string();
        };
        let Some(id) = args.first().and_then(|raw| raw.parse::<UserId>().ok()) else {
            let verb = if authorize { "authorize" } else { "deauthorize" };
            return format!("⚠️ Usage: :{verb} <user id>");
        };

        let result = if authorize {
            auth.authorize_by(&actor, id)
        } else {
            auth.deauthorize_by(&actor, id)
        };

        match result {
            Ok(AuthorizationChange::UnknownUser) => format!("⚠️ No user with id {id}."),
            Ok(change) => {
                let target = auth.find_user(id).map_or_else(|| id.to_string(), |u| u.to_string());
                match change {
                    AuthorizationChange::Updated => format!("✅ Updated: {target}"),
                    _ => format!("ℹ️ No change: {target}"),
                }
            }
            Err(e) if e.is_auth() => "⛔ Only admins can change authorization.".to_string(),
            Err(e) => e.user_message(),
        }
    }

    fn history(&self, args: &[&str]) -> String {
        let app = self.router.app();
        let Some(user) = app.auth.current_user() else {
            return "⚠️ Sign in to see your history.".to_string();
        };
        let full = args.iter().any(|arg| arg.eq_ignore_ascii_case("full"));
        let filter = args
            .iter()
            .copied()
            .find(|arg| !arg.eq_ignore_ascii_case("full"))
            .unwrap_or("all");
        let filter = match filter.parse::<HistoryFilter>() {
            Ok(filter) => filter,
            Err(e) => return format!("⚠️ {e}"),
        };

        let entries: Vec<_> = app
            .history
            .entries(filter)
            .into_iter()
            .filter(|log| log.user_id == user.id)
            .collect();
        if entries.is_empty() {
            return "📜 No commands yet.".to_string();
        }

        let mut text = String::from("📜 Command history:");
        for log in entries {
            let mark = if log.success { "✅" } else { "❌" };
            let _ = write!(
                text,
                "\n{} {mark} {}",
                format_timestamp(log.timestamp),
                log.command
            );
            if full {
                let excerpt = log.response.split_whitespace().collect::<Vec<_>>().join(" ");
                let excerpt = truncate_string(&excerpt, HISTORY_EXCERPT_CHARS);
                let _ = write!(text, "\n    ↳ {excerpt}");
            }
        }
        text
    }

    fn bots(&self) -> String {
        let bots = self.router.app().bots.list();
        if bots.is_empty() {
            return "🤖 No bots configured.".to_string();
        }
        let mut text = String::from("🤖 Bots:");
        for bot in bots {
            let _ = write!(text, "\n{} {} ({})", bot.id, bot.name, bot.status);
        }
        text
    }
}

/// Formats a user the way listings show them.
pub fn user_line(user: &User) -> String {
    format!("#{} {user} [{}] <{}>", user.id, user.role, user.email)
}
