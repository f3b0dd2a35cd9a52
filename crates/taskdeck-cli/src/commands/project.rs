use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use taskdeck_core::repository::{ProjectRepository, SqliteRepository};

use crate::cli::{ProjectAction, ProjectCommand};
use crate::views;

pub async fn project_command(repo: &SqliteRepository, command: ProjectCommand) -> Result<()> {
    match command.action {
        ProjectAction::Add { name, description } => {
            let project = repo.add_project(name, description).await?;
            println!("{} Added project: {}", "✓".green().bold(), project.name.bold());
        }
        ProjectAction::List => {
            let projects = repo.find_projects().await?;
            views::display_projects(&projects);
        }
        ProjectAction::Delete { name, force } => {
            if !force {
                let confirmation = Confirm::new()
                    .with_prompt(format!("Are you sure you want to delete project '{name}'?"))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            repo.delete_project(name.clone()).await?;
            println!("{} Deleted project: {}", "✓".green().bold(), name);
        }
    }
    Ok(())
}
