//! Persistence ports.
//!
//! Services talk to these traits only. `PgStore` backs them with Postgres,
//! `MemoryStore` with an in-process map for tests and database-less runs.
//!
//! Single-item reads return the bare record: ownership is decided by the
//! gate, not here. Listings and aggregates take the owner as a filter.
//! Updates and deletes assume the caller already passed the gate.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    NewProject, NewTask, NewUser, PriorityCount, Project, ProjectPatch, StatusCount, Task,
    TaskPatch, TaskQuery, User, UserRecord,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which set of tasks an aggregate runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task owned by this user.
    Owner(Uuid),
    /// Every task attached to this project.
    Project(Uuid),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email fails with `AppError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Looks up a user by normalised (lower-cased) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, owner: Uuid, project: NewProject) -> Result<Project, AppError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError>;

    /// The owner's projects, newest first.
    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError>;

    async fn update_project(&self, id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError>;

    /// Deletes the project and detaches its tasks (`project_id` becomes null).
    async fn delete_project(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// One filtered, sorted page of the owner's tasks plus the total match count.
    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, u64), AppError>;

    /// The `limit` most recently created tasks of a project.
    async fn recent_project_tasks(&self, project_id: Uuid, limit: u32) -> Result<Vec<Task>, AppError>;

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError>;

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError>;

    async fn count_by_status(&self, scope: TaskScope) -> Result<Vec<StatusCount>, AppError>;

    async fn count_by_priority(&self, scope: TaskScope) -> Result<Vec<PriorityCount>, AppError>;

    /// Tasks in scope that are not completed and due strictly before `now`.
    async fn count_overdue(&self, scope: TaskScope, now: DateTime<Utc>) -> Result<i64, AppError>;
}
