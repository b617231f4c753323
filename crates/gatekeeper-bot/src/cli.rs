//! Command line interface.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Gatekeeper: authorization-gated chat bot with simulated downloads.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper", author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GATEKEEPER_CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// What to do; defaults to the interactive console
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to the chat platform and serve commands until Ctrl-C
    Run,
    /// Interactive local session over stdin
    Console,
    /// Manage users
    #[command(subcommand)]
    Users(UsersCommand),
    /// Manage bot configurations
    #[command(subcommand)]
    Bots(BotsCommand),
    /// Print the command registry
    Commands,
}

/// Credentials of the administrator performing a change.
#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Administrator e-mail
    #[arg(long = "as", value_name = "EMAIL")]
    pub email: String,
    /// Administrator password
    #[arg(long, env = "GATEKEEPER_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// `users` subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UsersCommand {
    /// List all users
    List,
    /// Register a new (unauthorized) user
    Register {
        /// Display name
        username: String,
        /// Login e-mail
        email: String,
        /// Password
        password: String,
    },
    /// Grant access to restricted commands
    Authorize {
        /// User id
        id: u64,
        #[command(flatten)]
        admin: AdminCredentials,
    },
    /// Revoke access to restricted commands
    Deauthorize {
        /// User id
        id: u64,
        #[command(flatten)]
        admin: AdminCredentials,
    },
}

/// `bots` subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BotsCommand {
    /// List configured bots
    List,
    /// Add a bot
    Add {
        /// Display name
        name: String,
        /// Platform API key
        api_key: String,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Remove a bot
    Remove {
        /// Bot id
        id: String,
    },
    /// Mark a bot active
    Activate {
        /// Bot id
        id: String,
    },
    /// Mark a bot inactive
    Deactivate {
        /// Bot id
        id: String,
    },
}
