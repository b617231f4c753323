//! Command dispatch and the authorization gate.

use crate::download::DownloadRequest;
use crate::handlers::{CommandExecutor, HandlerError, Reply};
use crate::registry::CommandRegistry;
use gatekeeper_common::{normalize_whitespace, User};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Reply for tokens that are not registered commands.
pub const UNKNOWN_COMMAND_TEXT: &str = "⚠️ Unknown command. Type /help to see available commands.";

/// Reply when a restricted command is attempted without authorization.
pub const ACCESS_DENIED_TEXT: &str = "⛔ Access denied. You are not authorized for this command.";

/// Reply when a handler fails or panics.
pub const HANDLER_FAILURE_TEXT: &str = "❌ Error executing command.";

/// Why a dispatch did not produce a handler reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No registered command matches the first token.
    #[error("unknown command '{command}'")]
    UnknownCommand {
        /// The lower-cased token.
        command: String,
    },
    /// The command is restricted and the caller is not authorized.
    #[error("access denied to {command}")]
    AccessDenied {
        /// The command name.
        command: String,
    },
    /// The handler returned an error or panicked.
    #[error("{command} failed: {reason}")]
    HandlerFailure {
        /// The command name.
        command: String,
        /// Diagnostic detail for logs.
        reason: String,
    },
}

impl DispatchError {
    /// Fixed user-facing text for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnknownCommand { .. } => UNKNOWN_COMMAND_TEXT,
            Self::AccessDenied { .. } => ACCESS_DENIED_TEXT,
            Self::HandlerFailure { .. } => HANDLER_FAILURE_TEXT,
        }
    }
}

/// Result of dispatching one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The input line as typed, trimmed; recorded in history.
    pub command: String,
    /// Reply text.
    pub text: String,
    /// Whether the command ran and succeeded.
    pub success: bool,
    /// Download to simulate, only on success.
    pub download: Option<DownloadRequest>,
}

/// Splits an input line into the lower-cased command token and the
/// remaining tokens joined by single spaces.
pub fn parse_input(input: &str) -> (String, String) {
    let input = normalize_whitespace(input);
    match input.split_once(' ') {
        Some((command, params)) => (command.to_lowercase(), params.to_string()),
        None => (input.to_lowercase(), String::new()),
    }
}

/// Routes input lines to handlers, refusing restricted commands for
/// unauthorized users before the handler is ever called.
///
/// Stateless apart from the shared registry; history is the caller's job.
#[derive(Debug)]
pub struct Dispatcher<E> {
    registry: Arc<CommandRegistry>,
    executor: E,
}

impl<E: CommandExecutor> Dispatcher<E> {
    /// Creates a dispatcher.
    pub fn new(registry: Arc<CommandRegistry>, executor: E) -> Self {
        Self { registry, executor }
    }

    /// The registry commands are looked up in.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatches `input` on behalf of `user`; never fails.
    pub fn dispatch(&self, input: &str, user: Option<&User>) -> DispatchOutcome {
        let (command, params) = parse_input(input);
        let raw = input.trim().to_string();

        match self.try_dispatch(&command, &params, user) {
            Ok(reply) => DispatchOutcome {
                command: raw,
                text: reply.text,
                success: reply.success,
                download: reply.download.filter(|_| reply.success),
            },
            Err(err) => {
                match &err {
                    DispatchError::HandlerFailure { .. } => error!(error = %err, "Command failed"),
                    _ => debug!(error = %err, "Command rejected"),
                }
                DispatchOutcome {
                    command: raw,
                    text: err.user_message().to_string(),
                    success: false,
                    download: None,
                }
            }
        }
    }

    /// Dispatches an already parsed command, surfacing the failure kind.
    pub fn try_dispatch(
        &self,
        command: &str,
        params: &str,
        user: Option<&User>,
    ) -> Result<Reply, DispatchError> {
        let entry = self
            .registry
            .lookup(command)
            .ok_or_else(|| DispatchError::UnknownCommand {
                command: command.to_string(),
            })?;

        if entry.requires_auth && !user.is_some_and(|u| u.is_authorized) {
            warn!(
                command = entry.name,
                user = user.map(|u| u.username.as_str()),
                "Access denied"
            );
            return Err(DispatchError::AccessDenied {
                command: entry.name.to_string(),
            });
        }

        debug!(command = entry.name, params, "Executing command");

        let result = catch_unwind(AssertUnwindSafe(|| self.executor.execute(entry.kind, params)));
        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(HandlerError::Failed { message })) => Err(DispatchError::HandlerFailure {
                command: entry.name.to_string(),
                reason: message,
            }),
            Err(payload) => Err(DispatchError::HandlerFailure {
                command: entry.name.to_string(),
                reason: panic_message(payload.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::MockCommandExecutor;
    use crate::registry::CommandKind;
    use gatekeeper_common::test_utils::{property_testing, user_fixtures};
    use proptest::prelude::*;

    fn dispatcher(executor: MockCommandExecutor) -> Dispatcher<MockCommandExecutor> {
        Dispatcher::new(Arc::new(CommandRegistry::builtin()), executor)
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("  /Weather   New   York "),
            ("/weather".to_string(), "New York".to_string())
        );
        assert_eq!(parse_input(""), (String::new(), String::new()));
    }

    #[test]
    fn test_gated_commands_never_reach_handler() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().never();
        let dispatcher = dispatcher(executor);
        let unauthorized = user_fixtures::unauthorized_user();

        let gated: Vec<&str> = dispatcher
            .registry()
            .iter()
            .filter(|c| c.requires_auth)
            .map(|c| c.name)
            .collect();

        for name in gated {
            for user in [None, Some(&unauthorized)] {
                let outcome = dispatcher.dispatch(&format!("{name} https://example.com"), user);
                assert!(!outcome.success);
                assert_eq!(outcome.text, ACCESS_DENIED_TEXT);
                assert!(outcome.download.is_none());
            }
        }
    }

    #[test]
    fn test_handler_receives_kind_and_params() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|kind, params| *kind == CommandKind::Weather && params == "New York")
            .times(1)
            .returning(|_, params| Ok(Reply::text(format!("🌤 Weather for {params}:"))));

        let outcome = dispatcher(executor).dispatch(
            "/WEATHER  New   York",
            Some(&user_fixtures::authorized_user()),
        );

        assert!(outcome.success);
        assert_eq!(outcome.command, "/WEATHER  New   York");
        assert_eq!(outcome.text, "🌤 Weather for New York:");
    }

    #[test]
    fn test_handler_error_is_hidden() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .returning(|_, _| Err(HandlerError::failed("database on fire")));

        let outcome = dispatcher(executor).dispatch("/start", None);

        assert!(!outcome.success);
        assert_eq!(outcome.text, HANDLER_FAILURE_TEXT);
    }

    struct PanickingExecutor;

    impl CommandExecutor for PanickingExecutor {
        fn execute(&self, _kind: CommandKind, _params: &str) -> Result<Reply, HandlerError> {
            panic!("handler exploded")
        }
    }

    #[test]
    fn test_handler_panic_is_caught() {
        let dispatcher = Dispatcher::new(Arc::new(CommandRegistry::builtin()), PanickingExecutor);

        let outcome = dispatcher.dispatch("/time", None);
        assert!(!outcome.success);
        assert_eq!(outcome.text, HANDLER_FAILURE_TEXT);

        let err = dispatcher.try_dispatch("/time", "", None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::HandlerFailure { ref reason, .. } if reason.contains("handler exploded")
        ));
    }

    #[test]
    fn test_download_dropped_from_unsuccessful_reply() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().returning(|_, _| {
            Ok(Reply {
                text: "half-done".into(),
                success: false,
                download: Some(crate::DownloadRequest::new(crate::DownloadSource::YouTube, "u")),
            })
        });

        let outcome =
            dispatcher(executor).dispatch("/youtube u", Some(&user_fixtures::admin()));
        assert!(!outcome.success);
        assert!(outcome.download.is_none());
    }

    fn unregistered_command() -> impl Strategy<Value = String> {
        let registry = CommandRegistry::builtin();
        property_testing::command_token_strategy()
            .prop_filter("registered command", move |token| registry.lookup(token).is_none())
    }

    proptest! {
        #[test]
        fn prop_unregistered_tokens_are_unknown(
            token in unregistered_command(),
            params in property_testing::params_strategy(),
        ) {
            let mut executor = MockCommandExecutor::new();
            executor.expect_execute().never();
            let dispatcher = dispatcher(executor);

            let outcome = dispatcher.dispatch(&format!("{token} {params}"), Some(&user_fixtures::admin()));
            prop_assert!(!outcome.success);
            prop_assert_eq!(outcome.text, UNKNOWN_COMMAND_TEXT);
        }
    }
}
