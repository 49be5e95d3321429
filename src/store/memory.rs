use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, TaskScope, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    NewProject, NewTask, NewUser, PriorityCount, Project, ProjectPatch, ProjectSummary, SortOrder,
    StatusCount, Task, TaskPatch, TaskQuery, TaskSortField, User, UserRecord,
};

/// Records carry an insertion sequence so equal timestamps still sort stably.
struct Stored<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct State {
    next_seq: u64,
    users: HashMap<Uuid, Stored<UserRecord>>,
    projects: HashMap<Uuid, Stored<Project>>,
    tasks: HashMap<Uuid, Stored<Task>>,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Project with its derived task count filled in.
    fn hydrate_project(&self, project: &Project) -> Project {
        let task_count = self
            .tasks
            .values()
            .filter(|t| t.value.project_id == Some(project.id))
            .count();
        Project {
            task_count: task_count as i64,
            ..project.clone()
        }
    }

    /// Task with its project summary filled in.
    fn hydrate_task(&self, task: &Task) -> Task {
        let project = task
            .project_id
            .and_then(|id| self.projects.get(&id))
            .map(|p| ProjectSummary::from(&p.value));
        Task {
            project,
            ..task.clone()
        }
    }

    fn tasks_in(&self, scope: TaskScope) -> impl Iterator<Item = &Task> {
        self.tasks.values().map(|t| &t.value).filter(move |t| match scope {
            TaskScope::Owner(owner) => t.user_id == owner,
            TaskScope::Project(project_id) => t.project_id == Some(project_id),
        })
    }
}

/// In-process store used by the test suite and by development runs without
/// `DATABASE_URL`. Mirrors the Postgres contracts, including email
/// uniqueness and detaching tasks when their project is deleted.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orders `None` after every value, matching Postgres' default NULLS LAST
/// for ascending sorts (and NULLS FIRST for descending ones).
fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare_tasks(a: &Task, b: &Task, field: TaskSortField) -> Ordering {
    match field {
        TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        TaskSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        TaskSortField::DueDate => cmp_nulls_last(&a.due_date, &b.due_date),
        TaskSortField::Priority => a.priority.cmp(&b.priority),
        TaskSortField::Status => a.status.cmp(&b.status),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        let email = user.email.to_lowercase();
        if state.users.values().any(|u| u.value.email == email) {
            return Err(AppError::Conflict(
                "A record with this value already exists".into(),
            ));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.users.insert(
            record.id,
            Stored {
                seq,
                value: record.clone(),
            },
        );
        Ok(record.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let state = self.state.read().await;
        let email = email.to_lowercase();
        Ok(state
            .users
            .values()
            .find(|u| u.value.email == email)
            .map(|u| u.value.clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|u| u.value.clone().into()))
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, owner: Uuid, project: NewProject) -> Result<Project, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            user_id: owner,
            name: project.name,
            description: project.description,
            color: project.color,
            created_at: now,
            updated_at: now,
            task_count: 0,
        };
        let seq = state.next_seq();
        state.projects.insert(
            project.id,
            Stored {
                seq,
                value: project.clone(),
            },
        );
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let state = self.state.read().await;
        Ok(state.projects.get(&id).map(|p| state.hydrate_project(&p.value)))
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError> {
        let state = self.state.read().await;
        let mut projects: Vec<&Stored<Project>> = state
            .projects
            .values()
            .filter(|p| p.value.user_id == owner)
            .collect();
        projects.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(projects
            .into_iter()
            .map(|p| state.hydrate_project(&p.value))
            .collect())
    }

    async fn update_project(&self, id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        let mut state = self.state.write().await;
        let stored = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        patch.apply_to(&mut stored.value);
        stored.value.updated_at = Utc::now();
        let updated = stored.value.clone();
        Ok(state.hydrate_project(&updated))
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.projects.remove(&id).is_none() {
            return Err(AppError::NotFound("Record not found".into()));
        }
        for task in state.tasks.values_mut() {
            if task.value.project_id == Some(id) {
                task.value.project_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        if let Some(project_id) = task.project_id {
            if !state.projects.contains_key(&project_id) {
                return Err(AppError::NotFound("Project not found".into()));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
            project: None,
        };
        let seq = state.next_seq();
        state.tasks.insert(
            task.id,
            Stored {
                seq,
                value: task.clone(),
            },
        );
        Ok(state.hydrate_task(&task))
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).map(|t| state.hydrate_task(&t.value)))
    }

    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, u64), AppError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Stored<Task>> = state
            .tasks
            .values()
            .filter(|t| t.value.user_id == owner && query.matches(&t.value))
            .collect();

        let field = query.sort_by();
        let order = query.sort_order();
        matching.sort_by(|a, b| {
            let primary = compare_tasks(&a.value, &b.value, field);
            let primary = match order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then(a.seq.cmp(&b.seq))
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|t| state.hydrate_task(&t.value))
            .collect();
        Ok((page, total))
    }

    async fn recent_project_tasks(&self, project_id: Uuid, limit: u32) -> Result<Vec<Task>, AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<&Stored<Task>> = state
            .tasks
            .values()
            .filter(|t| t.value.project_id == Some(project_id))
            .collect();
        tasks.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(tasks
            .into_iter()
            .take(limit as usize)
            .map(|t| state.hydrate_task(&t.value))
            .collect())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        if let Some(project_id) = patch.target_project() {
            if !state.projects.contains_key(&project_id) {
                return Err(AppError::NotFound("Project not found".into()));
            }
        }
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        patch.apply_to(&mut stored.value);
        stored.value.updated_at = Utc::now();
        let updated = stored.value.clone();
        Ok(state.hydrate_task(&updated))
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state.tasks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Record not found".into())),
        }
    }

    async fn count_by_status(&self, scope: TaskScope) -> Result<Vec<StatusCount>, AppError> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for task in state.tasks_in(scope) {
            *counts.entry(task.status).or_insert(0i64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn count_by_priority(&self, scope: TaskScope) -> Result<Vec<PriorityCount>, AppError> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for task in state.tasks_in(scope) {
            *counts.entry(task.priority).or_insert(0i64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(priority, count)| PriorityCount { priority, count })
            .collect())
    }

    async fn count_overdue(&self, scope: TaskScope, now: DateTime<Utc>) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.tasks_in(scope).filter(|t| t.is_overdue(now)).count() as i64)
    }
}
