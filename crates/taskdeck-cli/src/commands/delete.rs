use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use taskdeck_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

pub async fn delete_task(repo: &SqliteRepository, command: DeleteCommand) -> Result<()> {
    let id = resolve_task_id(repo, &command.id).await?;
    let task = match repo.find_task_by_id(id).await? {
        Some(task) => task,
        None => {
            let error_style = Style::new().red().bold();
            eprintln!(
                "{} Task with ID '{}' not found.",
                "Error:".style(error_style),
                id
            );
            return Ok(());
        }
    };

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete task '{}'?",
                task.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    repo.delete_task(id).await?;
    println!("{} Deleted: {}", "✓".green().bold(), task.title);
    Ok(())
}
