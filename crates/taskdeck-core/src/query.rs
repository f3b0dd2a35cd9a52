use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{TaskPriority, TaskStatus};

/// Optional narrowing filters for the board listing. The three-way
/// template/instance/one-off classification is applied by the repository
/// before any of these; filters only narrow within the visible set.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub tag: Option<String>,
    pub due: Option<DueDate>,
}

#[derive(Debug, Clone)]
pub enum DueDate {
    Today,
    Overdue,
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
}
