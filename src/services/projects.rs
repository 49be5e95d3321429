use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::Deleted;
use crate::auth::authorize;
use crate::error::AppError;
use crate::models::{Project, ProjectDetail, ProjectInput, ProjectPatch, ProjectStats};
use crate::store::{ProjectStore, TaskScope, TaskStore};

/// How many of a project's newest tasks the detail view embeds.
pub const RECENT_TASKS_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    tasks: Arc<dyn TaskStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { projects, tasks }
    }

    /// Loads a project and runs the ownership gate on it.
    async fn owned(&self, caller: Uuid, id: Uuid) -> Result<Project, AppError> {
        authorize(self.projects.find_project(id).await?, caller)
    }

    pub async fn create(&self, caller: Uuid, input: ProjectInput) -> Result<Project, AppError> {
        let input = input.normalized();
        input.validate()?;

        let project = self.projects.insert_project(caller, input.into()).await?;
        log::info!("User {} created project {}", caller, project.id);
        Ok(project)
    }

    pub async fn list(&self, caller: Uuid) -> Result<Vec<Project>, AppError> {
        self.projects.list_projects(caller).await
    }

    pub async fn get(&self, caller: Uuid, id: Uuid) -> Result<ProjectDetail, AppError> {
        let project = self.owned(caller, id).await?;
        let tasks = self
            .tasks
            .recent_project_tasks(project.id, RECENT_TASKS_LIMIT)
            .await?;
        Ok(ProjectDetail { project, tasks })
    }

    /// Applies a partial update and returns the stored result.
    pub async fn update(&self, caller: Uuid, id: Uuid, patch: ProjectPatch) -> Result<Project, AppError> {
        let patch = patch.normalized();
        patch.validate()?;

        let project = self.owned(caller, id).await?;
        if patch.is_empty() {
            return Ok(project);
        }
        self.projects.update_project(project.id, &patch).await
    }

    /// Deletes the project; its tasks survive with no project.
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<Deleted, AppError> {
        let project = self.owned(caller, id).await?;
        self.projects.delete_project(project.id).await?;
        log::info!("User {} deleted project {}", caller, project.id);
        Ok(Deleted::new("Project deleted successfully"))
    }

    pub async fn stats(&self, caller: Uuid, id: Uuid) -> Result<ProjectStats, AppError> {
        let project = self.owned(caller, id).await?;
        let scope = TaskScope::Project(project.id);

        let by_status = self.tasks.count_by_status(scope).await?;
        let overdue = self.tasks.count_overdue(scope, Utc::now()).await?;
        Ok(ProjectStats::from_counts(by_status, overdue))
    }
}
