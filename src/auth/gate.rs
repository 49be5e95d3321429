//! Ownership gate.
//!
//! A caller may act on a resource iff `caller == resource.owner`. The gate is
//! consulted before every mutation and every single-resource read; listings
//! filter by owner in the store instead.
//!
//! Absent resources fail with `NotFound`, foreign ones with `Forbidden`, so
//! the two outcomes stay distinguishable only by status code.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Project, Task};

/// A resource with exactly one owning user.
pub trait Owned {
    const KIND: ResourceKind;

    fn owner_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Task,
}

impl ResourceKind {
    fn not_found(self) -> AppError {
        match self {
            ResourceKind::Project => AppError::NotFound("Project not found".into()),
            ResourceKind::Task => AppError::NotFound("Task not found".into()),
        }
    }

    fn forbidden(self) -> AppError {
        match self {
            ResourceKind::Project => AppError::Forbidden("Access denied to this project".into()),
            ResourceKind::Task => AppError::Forbidden("Access denied to this task".into()),
        }
    }
}

impl Owned for Project {
    const KIND: ResourceKind = ResourceKind::Project;

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Task {
    const KIND: ResourceKind = ResourceKind::Task;

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Decides whether `caller` may act on the loaded `resource`.
pub fn authorize<T: Owned>(resource: Option<T>, caller: Uuid) -> Result<T, AppError> {
    let resource = resource.ok_or_else(|| T::KIND.not_found())?;
    if resource.owner_id() != caller {
        log::warn!(
            "Denied {:?} access: caller {} is not owner {}",
            T::KIND,
            caller,
            resource.owner_id()
        );
        return Err(T::KIND.forbidden());
    }
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn task_owned_by(owner: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id: owner,
            project_id: None,
            title: "T".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: now,
            updated_at: now,
            project: None,
        }
    }

    fn project_owned_by(owner: Uuid) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            user_id: owner,
            name: "P".into(),
            description: None,
            color: None,
            created_at: now,
            updated_at: now,
            task_count: 0,
        }
    }

    #[test]
    fn test_owner_passes() {
        let owner = Uuid::new_v4();
        let task = task_owned_by(owner);
        let id = task.id;

        let allowed = authorize(Some(task), owner).unwrap();
        assert_eq!(allowed.id, id);
    }

    #[test]
    fn test_missing_resource_is_not_found() {
        match authorize::<Task>(None, Uuid::new_v4()) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Task not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        match authorize::<Project>(None, Uuid::new_v4()) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Project not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_foreign_resource_is_forbidden() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();

        match authorize(Some(project_owned_by(owner)), intruder) {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "Access denied to this project"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
        match authorize(Some(task_owned_by(owner)), intruder) {
            Err(AppError::Forbidden(msg)) => assert_eq!(msg, "Access denied to this task"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
