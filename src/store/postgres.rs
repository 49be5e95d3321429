use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ProjectStore, TaskScope, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    NewProject, NewTask, NewUser, PriorityCount, Project, ProjectPatch, ProjectSummary,
    StatusCount, Task, TaskPatch, TaskPriority, TaskQuery, TaskStatus, User, UserRecord,
};

const USER_COLUMNS: &str = "id, email, name, created_at, updated_at";

const PROJECT_COLUMNS: &str = "p.id, p.user_id, p.name, p.description, p.color, p.created_at, p.updated_at, \
     (SELECT COUNT(*) FROM tasks c WHERE c.project_id = p.id) AS task_count";

const TASK_COLUMNS: &str = "t.id, t.user_id, t.project_id, t.title, t.description, t.status, t.priority, \
     t.due_date, t.created_at, t.updated_at, p.name AS project_name, p.color AS project_color";

/// A task row joined with the name and colour of its project.
#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: Uuid,
    project_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    project_name: Option<String>,
    project_color: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let project = match (row.project_id, row.project_name) {
            (Some(id), Some(name)) => Some(ProjectSummary {
                id,
                name,
                color: row.project_color,
            }),
            _ => None,
        };
        Task {
            id: row.id,
            user_id: row.user_id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            project,
        }
    }
}

/// Escapes `LIKE` wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn scope_filter(scope: TaskScope) -> (&'static str, Uuid) {
    match scope {
        TaskScope::Owner(owner) => ("user_id", owner),
        TaskScope::Project(project_id) => ("project_id", project_id),
    }
}

/// Appends the owner filter and every optional filter of `query`.
fn push_task_filters(builder: &mut QueryBuilder<'_, Postgres>, owner: Uuid, query: &TaskQuery) {
    builder.push(" WHERE t.user_id = ").push_bind(owner);

    if let Some(status) = query.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = query.priority {
        builder.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(project_id) = query.project_id {
        builder.push(" AND t.project_id = ").push_bind(project_id);
    }
    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        builder
            .push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.email.to_lowercase())
            .bind(user.password_hash)
            .bind(user.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, name, created_at, updated_at \
             FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, owner: Uuid, project: NewProject) -> Result<Project, AppError> {
        let sql = format!(
            "WITH p AS ( \
                 INSERT INTO projects (id, user_id, name, description, color) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) SELECT {} FROM p",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(project.name)
            .bind(project.description)
            .bind(project.color)
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!("SELECT {} FROM projects p WHERE p.id = $1", PROJECT_COLUMNS);
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM projects p WHERE p.user_id = $1 ORDER BY p.created_at DESC, p.id",
            PROJECT_COLUMNS
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn update_project(&self, id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        let sql = format!(
            "WITH p AS ( \
                 UPDATE projects SET \
                     name = COALESCE($2, name), \
                     description = CASE WHEN $3 THEN $4 ELSE description END, \
                     color = CASE WHEN $5 THEN $6 ELSE color END, \
                     updated_at = now() \
                 WHERE id = $1 RETURNING * \
             ) SELECT {} FROM p",
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(patch.description.is_some())
            .bind(patch.description.clone().flatten())
            .bind(patch.color.is_some())
            .bind(patch.color.clone().flatten())
            .fetch_one(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Record not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, owner: Uuid, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "WITH t AS ( \
                 INSERT INTO tasks (id, user_id, project_id, title, description, status, priority, due_date) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING * \
             ) SELECT {} FROM t LEFT JOIN projects p ON p.id = t.project_id",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(task.project_id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t LEFT JOIN projects p ON p.id = t.project_id WHERE t.id = $1",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn list_tasks(&self, owner: Uuid, query: &TaskQuery) -> Result<(Vec<Task>, u64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_task_filters(&mut count, owner, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM tasks t LEFT JOIN projects p ON p.id = t.project_id",
            TASK_COLUMNS
        ));
        push_task_filters(&mut select, owner, query);
        select
            .push(format!(
                " ORDER BY t.{} {}, t.id",
                query.sort_by().column(),
                query.sort_order().as_sql()
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit()))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let rows: Vec<TaskRow> = select.build_query_as::<TaskRow>().fetch_all(&self.pool).await?;
        Ok((rows.into_iter().map(Task::from).collect(), total.max(0) as u64))
    }

    async fn recent_project_tasks(&self, project_id: Uuid, limit: u32) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t LEFT JOIN projects p ON p.id = t.project_id \
             WHERE t.project_id = $1 ORDER BY t.created_at DESC, t.id LIMIT $2",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(project_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, AppError> {
        let sql = format!(
            "WITH t AS ( \
                 UPDATE tasks SET \
                     title = COALESCE($2, title), \
                     description = CASE WHEN $3 THEN $4 ELSE description END, \
                     status = COALESCE($5, status), \
                     priority = COALESCE($6, priority), \
                     due_date = CASE WHEN $7 THEN $8 ELSE due_date END, \
                     project_id = CASE WHEN $9 THEN $10 ELSE project_id END, \
                     updated_at = now() \
                 WHERE id = $1 RETURNING * \
             ) SELECT {} FROM t LEFT JOIN projects p ON p.id = t.project_id",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.description.is_some())
            .bind(patch.description.clone().flatten())
            .bind(patch.status)
            .bind(patch.priority)
            .bind(patch.due_date.is_some())
            .bind(patch.due_date.flatten())
            .bind(patch.project_id.is_some())
            .bind(patch.project_id.flatten())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Record not found".into()));
        }
        Ok(())
    }

    async fn count_by_status(&self, scope: TaskScope) -> Result<Vec<StatusCount>, AppError> {
        let (column, id) = scope_filter(scope);
        let sql = format!(
            "SELECT status, COUNT(*) FROM tasks WHERE {} = $1 GROUP BY status ORDER BY status",
            column
        );
        let rows = sqlx::query_as::<_, (TaskStatus, i64)>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn count_by_priority(&self, scope: TaskScope) -> Result<Vec<PriorityCount>, AppError> {
        let (column, id) = scope_filter(scope);
        let sql = format!(
            "SELECT priority, COUNT(*) FROM tasks WHERE {} = $1 GROUP BY priority ORDER BY priority",
            column
        );
        let rows = sqlx::query_as::<_, (TaskPriority, i64)>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(priority, count)| PriorityCount { priority, count })
            .collect())
    }

    async fn count_overdue(&self, scope: TaskScope, now: DateTime<Utc>) -> Result<i64, AppError> {
        let (column, id) = scope_filter(scope);
        let sql = format!(
            "SELECT COUNT(*) FROM tasks WHERE {} = $1 AND status <> 'COMPLETED' AND due_date < $2",
            column
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
