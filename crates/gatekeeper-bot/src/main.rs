//! Main entry point for the Gatekeeper bot.

use anyhow::{Context, Result};
use clap::Parser;
use gatekeeper_bot::cli::{AdminCredentials, Args, BotsCommand, Command, UsersCommand};
use gatekeeper_bot::console::{user_line, Console, ConsoleSink};
use gatekeeper_bot::{chat, App, MessageRouter};
use gatekeeper_common::{init_logging, mask_secret, UserId};
use gatekeeper_config::ConfigLoader;
use gatekeeper_store::{AuthorizationChange, BotStatus, NewBot};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ConfigLoader::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Gatekeeper");

    let typing_delay = config.bot.typing_delay();
    let app = Arc::new(App::build(config)?);

    let result = match args.command.unwrap_or(Command::Console) {
        Command::Run => {
            let router = Arc::new(MessageRouter::new(app.clone()));
            chat::run(router).await.map_err(anyhow::Error::from)
        }
        Command::Console => {
            let router = Arc::new(MessageRouter::new(app.clone()));
            let console = Console::new(router);
            let sink = ConsoleSink::new(std::io::stdout(), typing_delay);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console.run(stdin, &sink).await.map_err(anyhow::Error::from)
        }
        Command::Users(command) => users(&app, command),
        Command::Bots(command) => bots(&app, command),
        Command::Commands => {
            for command in app.registry.iter() {
                let access = if command.requires_auth { "authorized" } else { "everyone" };
                println!("{:<12} {:<11} {}", command.name, access, command.description);
            }
            Ok(())
        }
    };

    if let Err(e) = app.shutdown() {
        error!("Failed to shut down cleanly: {}", e);
    }

    result
}

fn users(app: &App, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => {
            for user in app.auth.users() {
                println!("{}", user_line(&user));
            }
        }
        UsersCommand::Register {
            username,
            email,
            password,
        } => {
            let user = app.auth.register(&username, &email, &password)?;
            println!("Registered {}", user_line(&user));
        }
        UsersCommand::Authorize { id, admin } => {
            let change = with_admin(app, &admin, |actor| app.auth.authorize_by(actor, UserId(id)))?;
            report_change(app, UserId(id), change);
        }
        UsersCommand::Deauthorize { id, admin } => {
            let change =
                with_admin(app, &admin, |actor| app.auth.deauthorize_by(actor, UserId(id)))?;
            report_change(app, UserId(id), change);
        }
    }
    Ok(())
}

fn with_admin<T>(
    app: &App,
    admin: &AdminCredentials,
    action: impl FnOnce(&gatekeeper_common::User) -> gatekeeper_common::Result<T>,
) -> Result<T> {
    let actor = app.auth.verify_credentials(&admin.email, &admin.password)?;
    Ok(action(&actor)?)
}

fn report_change(app: &App, id: UserId, change: AuthorizationChange) {
    match (change, app.auth.find_user(id)) {
        (AuthorizationChange::UnknownUser, _) | (_, None) => println!("No user with id {id}"),
        (AuthorizationChange::Updated, Some(user)) => println!("Updated {}", user_line(&user)),
        (AuthorizationChange::Unchanged, Some(user)) => println!("Unchanged {}", user_line(&user)),
    }
}

fn bots(app: &App, command: BotsCommand) -> Result<()> {
    match command {
        BotsCommand::List => {
            for bot in app.bots.list() {
                println!(
                    "{}  {:<20} {:<8} key={} added={}  {}",
                    bot.id,
                    bot.name,
                    bot.status.as_str(),
                    mask_secret(&bot.api_key, 4),
                    bot.date_added.format("%Y-%m-%d"),
                    bot.description
                );
            }
        }
        BotsCommand::Add {
            name,
            api_key,
            description,
        } => {
            let bot = app.bots.add(NewBot {
                name,
                api_key,
                description,
            })?;
            println!("Added {} ({})", bot.name, bot.id);
        }
        BotsCommand::Remove { id } => report_bot(&id, app.bots.remove(&id)?, "Removed"),
        BotsCommand::Activate { id } => {
            report_bot(&id, app.bots.set_status(&id, BotStatus::Active)?, "Activated");
        }
        BotsCommand::Deactivate { id } => {
            report_bot(&id, app.bots.set_status(&id, BotStatus::Inactive)?, "Deactivated");
        }
    }
    Ok(())
}

fn report_bot(id: &str, found: bool, verb: &str) {
    if found {
        println!("{verb} {id}");
    } else {
        println!("No bot with id {id}");
    }
}
