use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::{created, ok};
use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ProjectInput, ProjectPatch},
    state::AppState,
};

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: `{project}`.
/// - `400 Bad Request`: name outside 1-100 characters, description over 500,
///   or a colour that is not `#RRGGBB`.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_data: web::Json<ProjectInput>,
) -> Result<HttpResponse, AppError> {
    let project = state.projects.create(user.id, project_data.into_inner()).await?;
    Ok(created(json!({ "project": project })))
}

/// The caller's projects, newest first, each with its `taskCount`.
#[get("")]
pub async fn get_projects(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let projects = state.projects.list(user.id).await?;
    Ok(ok(json!({ "projects": projects })))
}

/// A single project with its ten most recent tasks.
///
/// ## Responses:
/// - `200 OK`: `{project}` where `project.tasks` holds the recent tasks.
/// - `403 Forbidden`: the project belongs to another user.
/// - `404 Not Found`: no project with this id.
#[get("/{id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let project = state.projects.get(user.id, project_id.into_inner()).await?;
    Ok(ok(json!({ "project": project })))
}

/// Partial update; absent fields stay, `null` clears `description` or `color`.
/// Returns the updated project.
#[patch("/{id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
    project_data: web::Json<ProjectPatch>,
) -> Result<HttpResponse, AppError> {
    let project = state
        .projects
        .update(user.id, project_id.into_inner(), project_data.into_inner())
        .await?;
    Ok(ok(json!({ "project": project })))
}

/// Deletes a project. Its tasks are kept and lose their `projectId`.
#[delete("/{id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let deleted = state.projects.delete(user.id, project_id.into_inner()).await?;
    Ok(ok(deleted))
}

#[get("/{id}/stats")]
pub async fn get_project_stats(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let stats = state.projects.stats(user.id, project_id.into_inner()).await?;
    Ok(ok(stats))
}
