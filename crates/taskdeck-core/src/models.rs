use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Review,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::ToDo => write!(f, "To Do"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Review => write!(f, "Review"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        match normalized.as_str() {
            "todo" => Ok(TaskStatus::ToDo),
            "inprogress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "review" => Ok(TaskStatus::Review),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "Low"),
            TaskPriority::Medium => write!(f, "Medium"),
            TaskPriority::High => write!(f, "High"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

/// Cadence of a recurring template. `Daily` and `Weekly` are accepted at
/// creation; `Monthly` is only reachable through updates and is handled by
/// rollover, never by the sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recurrence::Daily => write!(f, "Daily"),
            Recurrence::Weekly => write!(f, "Weekly"),
            Recurrence::Monthly => write!(f, "Monthly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence: {0}")]
pub struct ParseRecurrenceError(String);

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(ParseRecurrenceError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub status: TaskStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Templates: anchor date plus the time-of-day at which the sweep fires.
    /// Instances: the concrete occurrence moment.
    pub deadline: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub module_id: Option<String>,
    pub tags: Json<Vec<String>>,
    pub progress: i64,
    pub subtasks: Json<Vec<Subtask>>,
    /// Set on templates only; never copied onto generated instances.
    pub recurring: Option<Recurrence>,
    /// Weekday indices 0=Sunday..6=Saturday; non-empty iff recurring = Weekly.
    pub recurring_days: Option<Json<Vec<u8>>>,
    /// Set on generated instances; points back at the template.
    pub parent_recurring_id: Option<Uuid>,
    /// YYYY-MM-DD day key (server timezone), set with parent_recurring_id;
    /// backs the one-instance-per-day uniqueness constraint.
    pub occurrence_day: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub history: Json<Vec<HistoryEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: String::new(),
            description: None,
            status: TaskStatus::ToDo,
            priority: TaskPriority::Medium,
            deadline: None,
            project_id: None,
            assignee_id: None,
            reporter_id: None,
            module_id: None,
            tags: Json(Vec::new()),
            progress: 0,
            subtasks: Json(Vec::new()),
            recurring: None,
            recurring_days: None,
            parent_recurring_id: None,
            occurrence_day: None,
            started_at: None,
            completed_at: None,
            history: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Explicit three-way classification of a task record. The storage schema
/// forbids `recurring` and `parent_recurring_id` from coexisting, so every
/// record maps to exactly one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Template(Recurrence),
    Instance(Uuid),
    OneOff,
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match (self.recurring, self.parent_recurring_id) {
            (_, Some(parent)) => TaskKind::Instance(parent),
            (Some(cadence), None) => TaskKind::Template(cadence),
            (None, None) => TaskKind::OneOff,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind(), TaskKind::Template(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind(), TaskKind::Instance(_))
    }

    /// Scheduled weekday indices, empty for non-weekly records.
    pub fn weekdays(&self) -> &[u8] {
        self.recurring_days
            .as_ref()
            .map(|days| days.0.as_slice())
            .unwrap_or(&[])
    }
}

pub fn clamp_progress(value: i64) -> i64 {
    value.clamp(0, 100)
}

/// Trims tags and drops empties, preserving order.
pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Assigns `s1`, `s2`, .. to subtasks that arrive without an id.
pub(crate) fn number_subtasks(subtasks: Vec<NewSubtask>) -> Vec<Subtask> {
    subtasks
        .into_iter()
        .enumerate()
        .map(|(idx, subtask)| Subtask {
            id: subtask.id.unwrap_or_else(|| format!("s{}", idx + 1)),
            title: subtask.title,
            completed: subtask.completed,
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct NewSubtask {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<DateTime<Utc>>,
    pub project_name: Option<String>, // Kept for CLI convenience
    pub project_id: Option<Uuid>,     // Used internally when already resolved
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub subtasks: Vec<NewSubtask>,
    /// Only Daily and Weekly are accepted when creating a template.
    pub recurring: Option<Recurrence>,
    /// Weekday indices for Weekly templates; ignored for other cadences.
    pub recurring_days: Vec<u8>,
    pub module_id: Option<String>,
}

impl NewTaskData {
    /// Synchronous validation, run before anything is persisted.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("title is required".to_string()));
        }
        match self.recurring {
            Some(Recurrence::Monthly) => Err(CoreError::InvalidInput(
                "recurring tasks are created as Daily or Weekly".to_string(),
            )),
            Some(Recurrence::Weekly) => {
                if self.recurring_days.is_empty() {
                    Err(CoreError::InvalidInput(
                        "weekly recurrence requires at least one weekday".to_string(),
                    ))
                } else if self.recurring_days.iter().any(|day| *day > 6) {
                    Err(CoreError::InvalidInput(
                        "weekday indices range from 0 (Sunday) to 6 (Saturday)".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub project_name: Option<Option<String>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub subtasks: Option<Vec<NewSubtask>>,
    /// `Some(None)` clears the recurrence tag (and the weekday set with it).
    pub recurring: Option<Option<Recurrence>>,
    pub recurring_days: Option<Vec<u8>>,
    pub module_id: Option<Option<String>>,
    pub progress: Option<i64>,
}

/// Outcome of `add_task`: recurring creations persist the template and, when
/// an anchor deadline is present, its first dated instance.
#[derive(Debug)]
pub enum CreatedTask {
    Single(Task),
    Template {
        template: Task,
        first_instance: Option<Task>,
    },
}

impl CreatedTask {
    /// The record a caller would show the user: the first instance when one
    /// was spawned, the stored record otherwise.
    pub fn into_task(self) -> Task {
        match self {
            CreatedTask::Single(task) => task,
            CreatedTask::Template {
                template,
                first_instance,
            } => first_instance.unwrap_or(template),
        }
    }
}

/// Outcome of a status update. `rollover` is the chained continuation created
/// when a recurrence-tagged task is completed; a failed rollover leaves it
/// `None` without failing the status change.
#[derive(Debug)]
pub struct StatusChange {
    pub task: Task,
    pub rollover: Option<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_human_and_machine_forms() {
        assert_eq!("To Do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!("to_do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!(
            "in-progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!("review".parse::<TaskStatus>().unwrap(), TaskStatus::Review);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn recurrence_parses_case_insensitively() {
        assert_eq!("Daily".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert_eq!("weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert!("yearly".parse::<Recurrence>().is_err());
    }

    #[test]
    fn validate_rejects_empty_title() {
        let data = NewTaskData {
            title: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            data.validate(),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_rejects_monthly_at_creation() {
        let data = NewTaskData {
            title: "Report".to_string(),
            recurring: Some(Recurrence::Monthly),
            ..Default::default()
        };
        assert!(matches!(data.validate(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_weekly_without_days() {
        let data = NewTaskData {
            title: "Standup".to_string(),
            recurring: Some(Recurrence::Weekly),
            recurring_days: vec![],
            ..Default::default()
        };
        assert!(matches!(data.validate(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_weekday() {
        let data = NewTaskData {
            title: "Standup".to_string(),
            recurring: Some(Recurrence::Weekly),
            recurring_days: vec![1, 9],
            ..Default::default()
        };
        assert!(matches!(data.validate(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn kind_classifies_all_three_shapes() {
        let mut task = Task::default();
        assert_eq!(task.kind(), TaskKind::OneOff);

        task.recurring = Some(Recurrence::Daily);
        assert_eq!(task.kind(), TaskKind::Template(Recurrence::Daily));

        let parent = Uuid::now_v7();
        task.recurring = None;
        task.parent_recurring_id = Some(parent);
        assert_eq!(task.kind(), TaskKind::Instance(parent));
    }

    #[test]
    fn subtasks_get_sequential_default_ids() {
        let numbered = number_subtasks(vec![
            NewSubtask {
                id: None,
                title: "first".to_string(),
                completed: true,
            },
            NewSubtask {
                id: Some("custom".to_string()),
                title: "second".to_string(),
                completed: false,
            },
            NewSubtask {
                id: None,
                title: "third".to_string(),
                completed: false,
            },
        ]);
        assert_eq!(numbered[0].id, "s1");
        assert_eq!(numbered[1].id, "custom");
        assert_eq!(numbered[2].id, "s3");
    }

    #[test]
    fn tags_are_trimmed_and_empties_dropped() {
        let tags = normalize_tags(vec![
            " backend ".to_string(),
            String::new(),
            "  ".to_string(),
            "ops".to_string(),
        ]);
        assert_eq!(tags, vec!["backend".to_string(), "ops".to_string()]);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(42), 42);
        assert_eq!(clamp_progress(250), 100);
    }
}
