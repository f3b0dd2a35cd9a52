use crate::clock::{Clock, SystemClock};
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    CreatedTask, NewTaskData, Project, StatusChange, Task, TaskStatus, UpdateTaskData,
};
use crate::query::TaskFilter;
use crate::recurrence::RecurrencePolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

// Re-export domain modules
pub mod materialization;
pub mod projects;
pub mod tasks;

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<CreatedTask, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_by_id_prefix(&self, prefix: &str) -> Result<Vec<Task>, CoreError>;
    /// Board view: instances and one-off tasks, never templates.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError>;
    /// Dedicated templates view: Daily/Weekly templates, never instances.
    async fn list_recurring_templates(&self) -> Result<Vec<Task>, CoreError>;
    async fn tasks_for_assignee(&self, assignee_id: Uuid) -> Result<Vec<Task>, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Applies a status transition, appending to history; completing a
    /// recurrence-tagged task also rolls over the next occurrence.
    async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<StatusChange, CoreError>;
    async fn update_progress(&self, id: Uuid, progress: i64) -> Result<Task, CoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for project operations
#[async_trait]
pub trait ProjectRepository {
    async fn add_project(&self, name: String, description: Option<String>)
        -> Result<Project, CoreError>;
    async fn find_project_by_id(&self, id: Uuid) -> Result<Option<Project>, CoreError>;
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError>;
    async fn find_projects(&self) -> Result<Vec<Project>, CoreError>;
    async fn delete_project(&self, name: String) -> Result<(), CoreError>;
}

/// Domain-specific trait for instance materialization, consumed by the sweep
/// scheduler and the creation path.
#[async_trait]
pub trait MaterializationRepository {
    /// Templates the sweep considers: Daily/Weekly, not instances, and with a
    /// deadline to supply the time-of-day gate.
    async fn find_recurring_templates(&self) -> Result<Vec<Task>, CoreError>;
    /// Existing instance of `template_id` on the calendar day containing `at`.
    async fn find_instance_for_day(
        &self,
        template_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Task>, CoreError>;
    /// Creates the dated instance for `occurrence` if and only if none exists
    /// yet for that template on that calendar day. Returns `None` when the
    /// instance already exists, the template vanished, or a concurrent writer
    /// won the day.
    async fn materialize_instance(
        &self,
        template_id: Uuid,
        occurrence: DateTime<Utc>,
    ) -> Result<Option<Task>, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository: TaskRepository + ProjectRepository + MaterializationRepository {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    policy: RecurrencePolicy,
    clock: Arc<dyn Clock>,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, policy: RecurrencePolicy) -> Self {
        Self::with_clock(pool, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: DbPool, policy: RecurrencePolicy, clock: Arc<dyn Clock>) -> Self {
        Self { pool, policy, clock }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn policy(&self) -> &RecurrencePolicy {
        &self.policy
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }
}

impl Repository for SqliteRepository {}
