use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::{OwoColorize, Style};
use taskdeck_core::models::TaskStatus;
use taskdeck_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::{DoneCommand, ProgressCommand, StatusCommand};
use crate::util::resolve_task_id;
use crate::views::format_deadline;

pub async fn complete_task(
    repo: &SqliteRepository,
    timezone: Tz,
    command: DoneCommand,
) -> Result<()> {
    let id = resolve_task_id(repo, &command.id).await?;
    let change = repo.update_status(id, TaskStatus::Completed).await?;

    let success_style = Style::new().green().bold();
    println!(
        "{} Completed: {}",
        "✓".style(success_style),
        change.task.title.bold()
    );
    if let Some(next) = change.rollover {
        println!(
            "  {} Next occurrence scheduled for {}",
            "→".blue(),
            format_deadline(next.deadline, timezone)
        );
    }
    Ok(())
}

pub async fn set_status(repo: &SqliteRepository, command: StatusCommand) -> Result<()> {
    let id = resolve_task_id(repo, &command.id).await?;
    let change = repo.update_status(id, command.status).await?;
    println!(
        "{} {} is now {}",
        "✓".green().bold(),
        change.task.title.bold(),
        change.task.status
    );
    Ok(())
}

pub async fn set_progress(repo: &SqliteRepository, command: ProgressCommand) -> Result<()> {
    let id = resolve_task_id(repo, &command.id).await?;
    let task = repo.update_progress(id, command.progress).await?;
    println!(
        "{} {} at {}%",
        "✓".green().bold(),
        task.title.bold(),
        task.progress
    );
    Ok(())
}
