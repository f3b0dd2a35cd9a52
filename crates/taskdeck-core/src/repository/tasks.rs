use crate::error::CoreError;
use crate::models::{
    clamp_progress, normalize_tags, number_subtasks, CreatedTask, HistoryEntry, NewTaskData,
    Project, Recurrence, StatusChange, Task, TaskPriority, TaskStatus, UpdateTaskData,
};
use crate::query::{DueDate, TaskFilter};
use crate::repository::{MaterializationRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::error;
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<CreatedTask, CoreError> {
        data.validate()?;
        let now = self.now();

        let mut tx = self.pool().begin().await?;
        let template = Self::build_task(&mut tx, data, now).await?;
        Self::insert_task(&mut *tx, &template).await?;
        tx.commit().await?;

        // Daily/Weekly creations also spawn the first dated instance so the
        // task shows up on the board immediately; a template without an
        // anchor deadline has nothing to spawn.
        if template.recurring.is_some() {
            let first_instance = match template.deadline {
                Some(anchor) => self.materialize_instance(template.id, anchor).await?,
                None => None,
            };
            Ok(CreatedTask::Template {
                template,
                first_instance,
            })
        } else {
            Ok(CreatedTask::Single(template))
        }
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_id_prefix(&self, prefix: &str) -> Result<Vec<Task>, CoreError> {
        // Ids are stored as 16-byte blobs; match the hyphen-less hex form of
        // whatever prefix of the display form the caller typed.
        let mut pattern: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_uppercase();
        pattern.push('%');

        let tasks: Vec<Task> = sqlx::query_as("SELECT * FROM tasks WHERE hex(id) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM tasks WHERE (parent_recurring_id IS NOT NULL OR recurring IS NULL)",
        );

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND priority = ");
            qb.push_bind(priority);
        }
        if let Some(project_id) = filter.project_id {
            qb.push(" AND project_id = ");
            qb.push_bind(project_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            qb.push(" AND assignee_id = ");
            qb.push_bind(assignee_id);
        }
        if let Some(tag) = &filter.tag {
            qb.push(" AND EXISTS (SELECT 1 FROM json_each(tasks.tags) WHERE json_each.value = ");
            qb.push_bind(tag.clone());
            qb.push(")");
        }
        match &filter.due {
            Some(DueDate::Today) => {
                let (start, end) = self.policy().day_bounds(self.now());
                qb.push(" AND deadline >= ");
                qb.push_bind(start);
                qb.push(" AND deadline <= ");
                qb.push_bind(end);
            }
            Some(DueDate::Overdue) => {
                qb.push(" AND deadline < ");
                qb.push_bind(self.now());
                qb.push(" AND status != ");
                qb.push_bind(TaskStatus::Completed);
            }
            Some(DueDate::Before(moment)) => {
                qb.push(" AND deadline < ");
                qb.push_bind(*moment);
            }
            Some(DueDate::After(moment)) => {
                qb.push(" AND deadline > ");
                qb.push_bind(*moment);
            }
            None => {}
        }

        qb.push(" ORDER BY deadline IS NULL, deadline, created_at DESC");

        let tasks: Vec<Task> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(tasks)
    }

    async fn list_recurring_templates(&self) -> Result<Vec<Task>, CoreError> {
        let templates: Vec<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE recurring IN ($1, $2) AND parent_recurring_id IS NULL
            ORDER BY created_at"#,
        )
        .bind(Recurrence::Daily)
        .bind(Recurrence::Weekly)
        .fetch_all(self.pool())
        .await?;
        Ok(templates)
    }

    async fn tasks_for_assignee(&self, assignee_id: Uuid) -> Result<Vec<Task>, CoreError> {
        let tasks: Vec<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE assignee_id = $1
              AND (parent_recurring_id IS NOT NULL OR recurring IS NULL)
            ORDER BY created_at DESC"#,
        )
        .bind(assignee_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        let now = self.now();
        let mut tx = self.pool().begin().await?;

        let mut task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if let Some(title) = data.title {
            if title.trim().is_empty() {
                return Err(CoreError::InvalidInput("title cannot be empty".to_string()));
            }
            task.title = title.trim().to_string();
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(deadline) = data.deadline {
            task.deadline = deadline;
        }
        if let Some(project_name) = data.project_name {
            task.project_id = match project_name {
                Some(name) => {
                    let project: Option<Project> =
                        sqlx::query_as("SELECT * FROM projects WHERE name = $1")
                            .bind(&name)
                            .fetch_optional(&mut *tx)
                            .await?;
                    Some(project.map(|p| p.id).ok_or(CoreError::NotFound(name))?)
                }
                None => None,
            };
        }
        if let Some(assignee_id) = data.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(tags) = data.tags {
            task.tags = Json(normalize_tags(tags));
        }
        if let Some(subtasks) = data.subtasks {
            task.subtasks = Json(number_subtasks(subtasks));
        }
        if let Some(module_id) = data.module_id {
            task.module_id = module_id;
        }
        if let Some(progress) = data.progress {
            task.progress = clamp_progress(progress);
        }

        let days_override = data.recurring_days;
        match data.recurring {
            Some(Some(cadence)) => {
                if task.parent_recurring_id.is_some() {
                    return Err(CoreError::InvalidInput(
                        "a generated instance cannot be given a recurrence rule".to_string(),
                    ));
                }
                if cadence == Recurrence::Weekly {
                    let days = days_override.unwrap_or_else(|| task.weekdays().to_vec());
                    task.recurring_days = Some(Json(Self::checked_weekdays(days)?));
                } else {
                    task.recurring_days = None;
                }
                task.recurring = Some(cadence);
            }
            Some(None) => {
                task.recurring = None;
                task.recurring_days = None;
            }
            None => {
                if let Some(days) = days_override {
                    if task.recurring == Some(Recurrence::Weekly) {
                        task.recurring_days = Some(Json(Self::checked_weekdays(days)?));
                    }
                }
            }
        }

        task.updated_at = now;
        Self::save_task(&mut *tx, &task).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<StatusChange, CoreError> {
        let now = self.now();
        let mut task = self
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let previous = task.status;
        task.status = status;
        task.history.0.push(HistoryEntry {
            status,
            timestamp: now,
        });
        if status == TaskStatus::InProgress && previous == TaskStatus::ToDo {
            task.started_at = Some(now);
        }
        if status == TaskStatus::Completed {
            task.completed_at = Some(now);
            task.progress = 100;
        }
        task.updated_at = now;
        Self::save_task(self.pool(), &task).await?;

        // Chained rollover fires only when the completed record itself
        // carries the recurrence tag; generated instances never chain. The
        // status change above is already persisted, so a failed rollover is
        // logged and reported as absent rather than unwinding the update.
        let rollover = match (status, task.recurring) {
            (TaskStatus::Completed, Some(cadence)) => {
                match self.roll_over(&task, cadence, now).await {
                    Ok(next) => Some(next),
                    Err(err) => {
                        error!(
                            task_id = %task.id,
                            error = %err,
                            "failed to create next occurrence after completion"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(StatusChange { task, rollover })
    }

    async fn update_progress(&self, id: Uuid, progress: i64) -> Result<Task, CoreError> {
        let now = self.now();
        let mut task = self
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        task.progress = clamp_progress(progress);
        task.updated_at = now;
        Self::save_task(self.pool(), &task).await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl SqliteRepository {
    /// Resolves the project reference and assembles the stored record.
    async fn build_task<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        mut data: NewTaskData,
        now: DateTime<Utc>,
    ) -> Result<Task, CoreError> {
        if data.project_id.is_none() {
            if let Some(project_name) = &data.project_name {
                let project: Option<Project> =
                    sqlx::query_as("SELECT * FROM projects WHERE name = $1")
                        .bind(project_name)
                        .fetch_optional(&mut **tx)
                        .await?;
                data.project_id = Some(
                    project
                        .map(|p| p.id)
                        .ok_or_else(|| CoreError::NotFound(project_name.clone()))?,
                );
            }
        }

        // The weekday set only means something on Weekly templates.
        let recurring_days = match data.recurring {
            Some(Recurrence::Weekly) => Some(Json(Self::checked_weekdays(data.recurring_days)?)),
            _ => None,
        };

        Ok(Task {
            id: Uuid::now_v7(),
            title: data.title.trim().to_string(),
            description: data.description,
            status: TaskStatus::ToDo,
            priority: data.priority.unwrap_or(TaskPriority::Medium),
            deadline: data.deadline,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            reporter_id: data.reporter_id,
            module_id: data.module_id,
            tags: Json(normalize_tags(data.tags)),
            progress: 0,
            subtasks: Json(number_subtasks(data.subtasks)),
            recurring: data.recurring,
            recurring_days,
            parent_recurring_id: None,
            occurrence_day: None,
            started_at: None,
            completed_at: None,
            history: Json(vec![HistoryEntry {
                status: TaskStatus::ToDo,
                timestamp: now,
            }]),
            created_at: now,
            updated_at: now,
        })
    }

    fn checked_weekdays(mut days: Vec<u8>) -> Result<Vec<u8>, CoreError> {
        if days.is_empty() {
            return Err(CoreError::InvalidInput(
                "weekly recurrence requires at least one weekday".to_string(),
            ));
        }
        if days.iter().any(|day| *day > 6) {
            return Err(CoreError::InvalidInput(
                "weekday indices range from 0 (Sunday) to 6 (Saturday)".to_string(),
            ));
        }
        days.sort_unstable();
        days.dedup();
        Ok(days)
    }

    /// The continuation created when a recurrence-tagged task is completed.
    /// It is template-shaped: the tag and weekday set carry over, there is no
    /// parent back-reference, and history starts fresh.
    async fn roll_over(
        &self,
        task: &Task,
        cadence: Recurrence,
        now: DateTime<Utc>,
    ) -> Result<Task, CoreError> {
        let anchor = task.deadline.unwrap_or(now);
        let next_deadline = self.policy().next_occurrence(cadence, anchor);

        let continuation = Task {
            id: Uuid::now_v7(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: TaskStatus::ToDo,
            priority: task.priority,
            deadline: Some(next_deadline),
            project_id: task.project_id,
            assignee_id: task.assignee_id,
            reporter_id: task.reporter_id,
            module_id: task.module_id.clone(),
            tags: task.tags.clone(),
            progress: 0,
            subtasks: Json(
                task.subtasks
                    .0
                    .iter()
                    .cloned()
                    .map(|mut subtask| {
                        subtask.completed = false;
                        subtask
                    })
                    .collect(),
            ),
            recurring: Some(cadence),
            recurring_days: task.recurring_days.clone(),
            parent_recurring_id: None,
            occurrence_day: None,
            started_at: None,
            completed_at: None,
            history: Json(vec![HistoryEntry {
                status: TaskStatus::ToDo,
                timestamp: now,
            }]),
            created_at: now,
            updated_at: now,
        };

        Self::insert_task(self.pool(), &continuation).await?;
        Ok(continuation)
    }

    pub(crate) async fn insert_task<'e, E>(executor: E, task: &Task) -> Result<(), CoreError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, status, priority, deadline,
                project_id, assignee_id, reporter_id, module_id, tags,
                progress, subtasks, recurring, recurring_days,
                parent_recurring_id, occurrence_day, started_at, completed_at,
                history, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )"#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.deadline)
        .bind(task.project_id)
        .bind(task.assignee_id)
        .bind(task.reporter_id)
        .bind(&task.module_id)
        .bind(task.tags.clone())
        .bind(task.progress)
        .bind(task.subtasks.clone())
        .bind(task.recurring)
        .bind(task.recurring_days.clone())
        .bind(task.parent_recurring_id)
        .bind(&task.occurrence_day)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.history.clone())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Full write-back of the mutable columns. The identity columns (`id`,
    /// `parent_recurring_id`, `occurrence_day`, `created_at`) never change
    /// after insert.
    pub(crate) async fn save_task<'e, E>(executor: E, task: &Task) -> Result<(), CoreError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE tasks SET
                title = $1, description = $2, status = $3, priority = $4,
                deadline = $5, project_id = $6, assignee_id = $7,
                reporter_id = $8, module_id = $9, tags = $10, progress = $11,
                subtasks = $12, recurring = $13, recurring_days = $14,
                started_at = $15, completed_at = $16, history = $17,
                updated_at = $18
            WHERE id = $19"#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.deadline)
        .bind(task.project_id)
        .bind(task.assignee_id)
        .bind(task.reporter_id)
        .bind(&task.module_id)
        .bind(task.tags.clone())
        .bind(task.progress)
        .bind(task.subtasks.clone())
        .bind(task.recurring)
        .bind(task.recurring_days.clone())
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.history.clone())
        .bind(task.updated_at)
        .bind(task.id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(task.id.to_string()));
        }
        Ok(())
    }
}
