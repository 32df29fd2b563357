//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use imagegen_core::error::CoreError;
use imagegen_db::models::project::{CreateProject, Project};
use imagegen_db::repositories::ProjectRepo;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(slug = %project.slug, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Project", &slug))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{slug}
///
/// Removes the project's work items, jobs, runs and image rows. Image files
/// stay on disk.
pub async fn delete(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    ProjectRepo::delete(&state.pool, &slug).await?;
    tracing::info!(%slug, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
