use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskPatch, TaskQuery},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::{created, ok};

/// Retrieves one page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `TODO`, `IN_PROGRESS` or `COMPLETED`.
/// - `priority` (optional): `LOW`, `MEDIUM` or `HIGH`.
/// - `projectId` (optional): only tasks attached to this project.
/// - `search` (optional): case-insensitive match in title or description.
/// - `page` (default 1), `limit` (default 10, at most 100).
/// - `sortBy` (default `createdAt`): `createdAt`, `updatedAt`, `dueDate`,
///   `priority` or `status`. `sortOrder` (default `desc`): `asc` or `desc`.
///
/// ## Responses:
/// - `200 OK`: `{tasks, pagination: {page, limit, total, totalPages}}`.
/// - `400 Bad Request`: unknown enum value or out-of-range paging.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query_params: web::Query<TaskQuery>,
) -> Result<HttpResponse, AppError> {
    let page = state.tasks.list(user.id, query_params.into_inner()).await?;
    Ok(ok(page))
}

/// Creates a new task for the authenticated user.
///
/// The owner is always the caller. When `projectId` is given the project
/// must belong to the caller, otherwise nothing is written.
///
/// ## Responses:
/// - `201 Created`: `{task}`.
/// - `400 Bad Request`: title outside 1-200 characters, description over 2000.
/// - `403 Forbidden` / `404 Not Found`: the referenced project is foreign or missing.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<HttpResponse, AppError> {
    let task = state.tasks.create(user.id, task_data.into_inner()).await?;
    Ok(created(json!({ "task": task })))
}

/// Aggregate statistics over all of the caller's tasks.
#[get("/stats")]
pub async fn get_task_stats(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let stats = state.tasks.stats(user.id).await?;
    Ok(ok(stats))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{task}`.
/// - `403 Forbidden`: the task belongs to another user.
/// - `404 Not Found`: no task with this id.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let task = state.tasks.get(user.id, task_id.into_inner()).await?;
    Ok(ok(json!({ "task": task })))
}

/// Partially updates a task and returns the updated record.
///
/// Absent fields are left untouched; `null` clears `description`, `dueDate`
/// or `projectId`. Moving the task into a project gates that project too.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskPatch>,
) -> Result<HttpResponse, AppError> {
    let task = state
        .tasks
        .update(user.id, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(ok(json!({ "task": task })))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = state.tasks.delete(user.id, task_id.into_inner()).await?;
    Ok(ok(deleted))
}
