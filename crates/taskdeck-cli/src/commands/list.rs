use anyhow::Result;
use chrono_tz::Tz;
use std::collections::HashMap;
use taskdeck_core::error::CoreError;
use taskdeck_core::query::{DueDate, TaskFilter};
use taskdeck_core::repository::{ProjectRepository, SqliteRepository, TaskRepository};
use uuid::Uuid;

use crate::cli::ListCommand;
use crate::views;

pub async fn list_tasks(
    repo: &SqliteRepository,
    timezone: Tz,
    command: ListCommand,
) -> Result<()> {
    let mut filter = TaskFilter {
        status: command.status,
        priority: command.priority,
        assignee_id: command.assignee,
        tag: command.tag,
        ..Default::default()
    };
    if command.today {
        filter.due = Some(DueDate::Today);
    } else if command.overdue {
        filter.due = Some(DueDate::Overdue);
    }
    if let Some(name) = &command.project {
        let project = repo
            .find_project_by_name(name)
            .await?
            .ok_or_else(|| CoreError::NotFound(name.clone()))?;
        filter.project_id = Some(project.id);
    }

    let tasks = repo.list_tasks(&filter).await?;
    let projects = project_names(repo).await?;
    views::display_tasks(&tasks, &projects, timezone);
    Ok(())
}

pub async fn list_templates(repo: &SqliteRepository, timezone: Tz) -> Result<()> {
    let templates = repo.list_recurring_templates().await?;
    let projects = project_names(repo).await?;
    views::display_templates(&templates, &projects, timezone);
    Ok(())
}

async fn project_names(repo: &SqliteRepository) -> Result<HashMap<Uuid, String>> {
    Ok(repo
        .find_projects()
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}
