use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::Deleted;
use crate::auth::authorize;
use crate::error::AppError;
use crate::models::{Pagination, Task, TaskInput, TaskPage, TaskPatch, TaskQuery, TaskStats};
use crate::store::{ProjectStore, TaskScope, TaskStore};

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, projects: Arc<dyn ProjectStore>) -> Self {
        Self { tasks, projects }
    }

    async fn owned(&self, caller: Uuid, id: Uuid) -> Result<Task, AppError> {
        authorize(self.tasks.find_task(id).await?, caller)
    }

    /// A task may only be attached to a project of its own owner.
    async fn check_project(&self, caller: Uuid, project_id: Uuid) -> Result<(), AppError> {
        authorize(self.projects.find_project(project_id).await?, caller)?;
        Ok(())
    }

    pub async fn create(&self, caller: Uuid, input: TaskInput) -> Result<Task, AppError> {
        let input = input.normalized();
        input.validate()?;

        if let Some(project_id) = input.project_id {
            self.check_project(caller, project_id).await?;
        }

        let task = self.tasks.insert_task(caller, input.into()).await?;
        log::info!("User {} created task {}", caller, task.id);
        Ok(task)
    }

    /// One page of the caller's tasks matching `query`.
    pub async fn list(&self, caller: Uuid, query: TaskQuery) -> Result<TaskPage, AppError> {
        query.validate()?;

        let (tasks, total) = self.tasks.list_tasks(caller, &query).await?;
        Ok(TaskPage {
            tasks,
            pagination: Pagination::new(query.page(), query.limit(), total),
        })
    }

    pub async fn get(&self, caller: Uuid, id: Uuid) -> Result<Task, AppError> {
        self.owned(caller, id).await
    }

    /// Applies a partial update and returns the stored result. Moving the
    /// task into a project gates that project as well.
    pub async fn update(&self, caller: Uuid, id: Uuid, patch: TaskPatch) -> Result<Task, AppError> {
        let patch = patch.normalized();
        patch.validate()?;

        let task = self.owned(caller, id).await?;
        if patch.is_empty() {
            return Ok(task);
        }
        if let Some(project_id) = patch.target_project() {
            self.check_project(caller, project_id).await?;
        }
        self.tasks.update_task(task.id, &patch).await
    }

    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<Deleted, AppError> {
        let task = self.owned(caller, id).await?;
        self.tasks.delete_task(task.id).await?;
        log::info!("User {} deleted task {}", caller, task.id);
        Ok(Deleted::new("Task deleted successfully"))
    }

    pub async fn stats(&self, caller: Uuid) -> Result<TaskStats, AppError> {
        let scope = TaskScope::Owner(caller);

        let by_status = self.tasks.count_by_status(scope).await?;
        let by_priority = self.tasks.count_by_priority(scope).await?;
        let overdue = self.tasks.count_overdue(scope, Utc::now()).await?;
        Ok(TaskStats::from_counts(by_status, by_priority, overdue))
    }
}
