use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use taskdeck_core::models::{Recurrence, UpdateTaskData};
use taskdeck_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::EditCommand;
use crate::parser::{parse_deadline, parse_weekdays};
use crate::util::resolve_task_id;

pub async fn edit_task(
    repo: &SqliteRepository,
    timezone: Tz,
    command: EditCommand,
) -> Result<()> {
    let id = resolve_task_id(repo, &command.id).await?;

    let mut data = UpdateTaskData::default();
    if let Some(title) = command.title {
        data.title = Some(title);
    }
    if let Some(description) = command.description {
        data.description = Some(Some(description));
    }
    if let Some(priority) = command.priority {
        data.priority = Some(priority);
    }
    if command.clear_deadline {
        data.deadline = Some(None);
    } else if let Some(raw) = command.deadline.as_deref() {
        data.deadline = Some(Some(parse_deadline(raw, timezone)?));
    }
    if let Some(raw) = command.recurring.as_deref() {
        data.recurring = Some(match raw.to_lowercase().as_str() {
            "none" | "off" => None,
            other => Some(other.parse::<Recurrence>()?),
        });
    }
    if let Some(days) = command.on.as_deref() {
        data.recurring_days = Some(parse_weekdays(days)?);
    }
    if let Some(progress) = command.progress {
        data.progress = Some(progress);
    }
    if let Some(module) = command.module {
        data.module_id = Some(Some(module));
    }

    let task = repo.update_task(id, data).await?;
    println!("{} Updated: {}", "✓".green().bold(), task.title.bold());
    Ok(())
}
