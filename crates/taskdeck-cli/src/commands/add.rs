use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::{OwoColorize, Style};
use taskdeck_core::models::{CreatedTask, NewSubtask, NewTaskData};
use taskdeck_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::AddCommand;
use crate::parser::{parse_deadline, parse_weekdays};
use crate::views::{format_deadline, short_id};

pub async fn add_task(
    repo: &SqliteRepository,
    timezone: Tz,
    command: AddCommand,
) -> Result<()> {
    let deadline = command
        .deadline
        .as_deref()
        .map(|raw| parse_deadline(raw, timezone))
        .transpose()?;
    let recurring_days = command
        .on
        .as_deref()
        .map(parse_weekdays)
        .transpose()?
        .unwrap_or_default();
    let subtasks = command
        .subtask
        .into_iter()
        .map(|title| NewSubtask {
            id: None,
            title,
            completed: false,
        })
        .collect();

    let data = NewTaskData {
        title: command.title,
        description: command.description,
        priority: command.priority,
        deadline,
        project_name: command.project,
        project_id: None,
        assignee_id: command.assignee,
        reporter_id: command.reporter,
        tags: command.tag,
        subtasks,
        recurring: command.every,
        recurring_days,
        module_id: command.module,
    };

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match repo.add_task(data).await? {
        CreatedTask::Single(task) => {
            println!(
                "{} Added task: {}",
                "✓".style(success_style),
                task.title.bold()
            );
            println!("  {} ID: {}", "→".style(info_style), short_id(&task.id).yellow());
        }
        CreatedTask::Template {
            template,
            first_instance,
        } => {
            let cadence = template
                .recurring
                .map(|c| c.to_string())
                .unwrap_or_default();
            println!(
                "{} Added {} template: {}",
                "✓".style(success_style),
                cadence,
                template.title.bold()
            );
            println!(
                "  {} Template ID: {}",
                "→".style(info_style),
                short_id(&template.id).yellow()
            );
            match first_instance {
                Some(instance) => println!(
                    "  {} First instance due {}",
                    "→".style(info_style),
                    format_deadline(instance.deadline, timezone)
                ),
                None => println!(
                    "  {} No deadline set; the sweep will not generate instances",
                    "→".style(info_style)
                ),
            }
        }
    }

    Ok(())
}
