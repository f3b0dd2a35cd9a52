use crate::error::CoreError;
use crate::models::Project;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl super::ProjectRepository for SqliteRepository {
    async fn add_project(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Project, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "project name is required".to_string(),
            ));
        }

        let project = Project {
            id: Uuid::now_v7(),
            name: name.trim().to_string(),
            description,
            created_at: self.now(),
        };

        sqlx::query(
            "INSERT INTO projects (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at)
        .execute(self.pool())
        .await?;

        Ok(project)
    }

    async fn find_project_by_id(&self, id: Uuid) -> Result<Option<Project>, CoreError> {
        let project = sqlx::query_as("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(project)
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, CoreError> {
        let project = sqlx::query_as("SELECT * FROM projects WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(project)
    }

    async fn find_projects(&self) -> Result<Vec<Project>, CoreError> {
        let projects = sqlx::query_as("SELECT * FROM projects ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(projects)
    }

    async fn delete_project(&self, name: String) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE name = $1")
            .bind(&name)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(name));
        }
        Ok(())
    }
}
