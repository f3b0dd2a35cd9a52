use std::process;
use std::sync::Arc;

use chrono_tz::Tz;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use taskdeck_core::db;
use taskdeck_core::error::CoreError;
use taskdeck_core::recurrence::RecurrencePolicy;
use taskdeck_core::repository::SqliteRepository;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} invalid configuration: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let timezone: Tz = match config.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            eprintln!(
                "{} invalid timezone '{}'; use an IANA name like 'Europe/Berlin'",
                "Error:".red().bold(),
                config.timezone
            );
            process::exit(1);
        }
    };

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let repository = Arc::new(SqliteRepository::new(
        db_pool,
        RecurrencePolicy::new(timezone),
    ));

    let result = match cli.command {
        cli::Commands::Add(command) => {
            commands::add::add_task(&repository, timezone, command).await
        }
        cli::Commands::List(command) => {
            commands::list::list_tasks(&repository, timezone, command).await
        }
        cli::Commands::Templates => commands::list::list_templates(&repository, timezone).await,
        cli::Commands::Done(command) => {
            commands::done::complete_task(&repository, timezone, command).await
        }
        cli::Commands::Status(command) => commands::done::set_status(&repository, command).await,
        cli::Commands::Progress(command) => {
            commands::done::set_progress(&repository, command).await
        }
        cli::Commands::Edit(command) => {
            commands::edit::edit_task(&repository, timezone, command).await
        }
        cli::Commands::Delete(command) => commands::delete::delete_task(&repository, command).await,
        cli::Commands::Project(command) => {
            commands::project::project_command(&repository, command).await
        }
        cli::Commands::Sweep(command) => {
            commands::sweep::sweep(Arc::clone(&repository), &config, command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::AmbiguousId(tasks) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, title) in tasks {
                    eprintln!("  {} ({})", id.yellow(), title);
                }
            }
            other => {
                eprintln!("{} {}", "Error:".style(error_style), other);
            }
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
    process::exit(1);
}
