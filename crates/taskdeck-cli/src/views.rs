use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use std::collections::HashMap;
use taskdeck_core::models::{Project, Task, TaskPriority, TaskStatus};
use uuid::Uuid;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn format_deadline(deadline: Option<DateTime<Utc>>, timezone: Tz) -> String {
    deadline
        .map(|d| d.with_timezone(&timezone).format("%d-%b-%Y %H:%M").to_string())
        .unwrap_or_default()
}

pub fn display_tasks(tasks: &[Task], projects: &HashMap<Uuid, String>, timezone: Tz) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Title", "Status", "Priority", "Deadline", "Project", "Progress", "Tags",
    ]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title_cell = Cell::new(&task.title);
        title_cell = match task.status {
            TaskStatus::Completed => title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey),
            _ => match task.priority {
                TaskPriority::High => title_cell.fg(Color::Red).add_attribute(Attribute::Bold),
                TaskPriority::Medium => title_cell.fg(Color::Yellow),
                TaskPriority::Low => title_cell.fg(Color::Green),
            },
        };
        row.add_cell(title_cell);

        let status_cell = match task.status {
            TaskStatus::Completed => Cell::new(task.status.to_string()).fg(Color::Green),
            TaskStatus::InProgress => Cell::new(task.status.to_string()).fg(Color::Cyan),
            TaskStatus::Review => Cell::new(task.status.to_string()).fg(Color::Magenta),
            TaskStatus::ToDo => Cell::new(task.status.to_string()),
        };
        row.add_cell(status_cell);

        row.add_cell(Cell::new(task.priority.to_string()));
        row.add_cell(Cell::new(format_deadline(task.deadline, timezone)));
        row.add_cell(Cell::new(
            task.project_id
                .and_then(|id| projects.get(&id).cloned())
                .unwrap_or_default(),
        ));
        row.add_cell(Cell::new(format!("{}%", task.progress)));
        row.add_cell(Cell::new(task.tags.0.join(", ")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_templates(templates: &[Task], projects: &HashMap<Uuid, String>, timezone: Tz) {
    if templates.is_empty() {
        println!("No recurring templates.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Cadence", "Days", "At", "Project"]);

    for template in templates {
        let cadence = template
            .recurring
            .map(|c| c.to_string())
            .unwrap_or_default();
        let days = template
            .weekdays()
            .iter()
            .map(|d| WEEKDAY_NAMES[*d as usize])
            .collect::<Vec<_>>()
            .join(", ");
        let at = template
            .deadline
            .map(|d| d.with_timezone(&timezone).format("%H:%M").to_string())
            .unwrap_or_else(|| "—".to_string());

        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&template.id)));
        row.add_cell(Cell::new(&template.title).fg(Color::Cyan));
        row.add_cell(Cell::new(cadence));
        row.add_cell(Cell::new(days));
        row.add_cell(Cell::new(at));
        row.add_cell(Cell::new(
            template
                .project_id
                .and_then(|id| projects.get(&id).cloned())
                .unwrap_or_default(),
        ));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Description"]);
    for project in projects {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&project.id)));
        row.add_cell(Cell::new(&project.name).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(project.description.clone().unwrap_or_default()));
        table.add_row(row);
    }
    println!("{table}");
}
