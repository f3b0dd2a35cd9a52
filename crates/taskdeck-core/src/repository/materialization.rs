use crate::error::CoreError;
use crate::models::{HistoryEntry, Recurrence, Task, TaskStatus};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

#[async_trait]
impl super::MaterializationRepository for SqliteRepository {
    async fn find_recurring_templates(&self) -> Result<Vec<Task>, CoreError> {
        let templates: Vec<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE recurring IN ($1, $2)
              AND parent_recurring_id IS NULL
              AND deadline IS NOT NULL
            ORDER BY created_at"#,
        )
        .bind(Recurrence::Daily)
        .bind(Recurrence::Weekly)
        .fetch_all(self.pool())
        .await?;
        Ok(templates)
    }

    async fn find_instance_for_day(
        &self,
        template_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Task>, CoreError> {
        let (day_start, day_end) = self.policy().day_bounds(at);
        let instance = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE parent_recurring_id = $1
              AND deadline >= $2 AND deadline <= $3"#,
        )
        .bind(template_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_optional(self.pool())
        .await?;
        Ok(instance)
    }

    async fn materialize_instance(
        &self,
        template_id: Uuid,
        occurrence: DateTime<Utc>,
    ) -> Result<Option<Task>, CoreError> {
        let mut tx = self.pool().begin().await?;

        // Template re-fetched inside the transaction: one deleted between a
        // sweep's load and this call is a skip, not a failure.
        let template: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(template_id)
            .fetch_optional(&mut *tx)
            .await?;
        let template = match template {
            Some(template) => template,
            None => return Ok(None),
        };
        if template.recurring.is_none() || template.parent_recurring_id.is_some() {
            return Err(CoreError::InvalidInput(
                "only recurrence-tagged tasks spawn dated instances".to_string(),
            ));
        }

        let (day_start, day_end) = self.policy().day_bounds(occurrence);
        let existing: Option<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE parent_recurring_id = $1
              AND deadline >= $2 AND deadline <= $3"#,
        )
        .bind(template_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let now = self.now();
        let instance = Task {
            id: Uuid::now_v7(),
            title: template.title.clone(),
            description: template.description.clone(),
            status: TaskStatus::ToDo,
            priority: template.priority,
            deadline: Some(occurrence),
            project_id: template.project_id,
            assignee_id: template.assignee_id,
            reporter_id: template.reporter_id,
            module_id: template.module_id.clone(),
            tags: template.tags.clone(),
            progress: 0,
            // A fresh instance starts with nothing done, whatever state the
            // template's subtask list has accumulated.
            subtasks: Json(
                template
                    .subtasks
                    .0
                    .iter()
                    .cloned()
                    .map(|mut subtask| {
                        subtask.completed = false;
                        subtask
                    })
                    .collect(),
            ),
            recurring: None,
            recurring_days: None,
            parent_recurring_id: Some(template.id),
            occurrence_day: Some(self.policy().day_key(occurrence)),
            started_at: None,
            completed_at: None,
            history: Json(vec![HistoryEntry {
                status: TaskStatus::ToDo,
                timestamp: now,
            }]),
            created_at: now,
            updated_at: now,
        };

        // The partial unique index on (parent_recurring_id, occurrence_day)
        // is the authority on "one instance per template per day": a
        // concurrent writer that got here first turns this insert into a
        // no-op instead of a duplicate.
        let result = sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, status, priority, deadline,
                project_id, assignee_id, reporter_id, module_id, tags,
                progress, subtasks, recurring, recurring_days,
                parent_recurring_id, occurrence_day, started_at, completed_at,
                history, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            ON CONFLICT (parent_recurring_id, occurrence_day)
                WHERE parent_recurring_id IS NOT NULL AND occurrence_day IS NOT NULL
                DO NOTHING"#,
        )
        .bind(instance.id)
        .bind(&instance.title)
        .bind(&instance.description)
        .bind(instance.status)
        .bind(instance.priority)
        .bind(instance.deadline)
        .bind(instance.project_id)
        .bind(instance.assignee_id)
        .bind(instance.reporter_id)
        .bind(&instance.module_id)
        .bind(instance.tags.clone())
        .bind(instance.progress)
        .bind(instance.subtasks.clone())
        .bind(instance.recurring)
        .bind(instance.recurring_days.clone())
        .bind(instance.parent_recurring_id)
        .bind(&instance.occurrence_day)
        .bind(instance.started_at)
        .bind(instance.completed_at)
        .bind(instance.history.clone())
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            Ok(None)
        } else {
            Ok(Some(instance))
        }
    }
}
