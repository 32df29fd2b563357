//! Handlers for work items nested under `/projects/{slug}/work-items`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use imagegen_core::error::CoreError;
use imagegen_db::models::work_item::{CreateWorkItem, UpdatePrompt, WorkItem};
use imagegen_db::repositories::WorkItemRepo;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects/{slug}/work-items
pub async fn create(
    State(state): State<AppState>,
    Path(project_slug): Path<String>,
    JsonBody(input): JsonBody<CreateWorkItem>,
) -> AppResult<(StatusCode, Json<DataResponse<WorkItem>>)> {
    let item = WorkItemRepo::create(&state.pool, &project_slug, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// GET /api/v1/projects/{slug}/work-items
pub async fn list(
    State(state): State<AppState>,
    Path(project_slug): Path<String>,
) -> AppResult<Json<DataResponse<Vec<WorkItem>>>> {
    let items = WorkItemRepo::list(&state.pool, &project_slug).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/projects/{slug}/work-items/{item}
pub async fn get(
    State(state): State<AppState>,
    Path((project_slug, item_slug)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<WorkItem>>> {
    let item = WorkItemRepo::find(&state.pool, &project_slug, &item_slug)
        .await?
        .ok_or_else(|| CoreError::not_found("WorkItem", format!("{project_slug}/{item_slug}")))?;
    Ok(Json(DataResponse { data: item }))
}

/// PUT /api/v1/projects/{slug}/work-items/{item}/prompt
pub async fn update_prompt(
    State(state): State<AppState>,
    Path((project_slug, item_slug)): Path<(String, String)>,
    JsonBody(input): JsonBody<UpdatePrompt>,
) -> AppResult<Json<DataResponse<WorkItem>>> {
    let item =
        WorkItemRepo::update_prompt(&state.pool, &project_slug, &item_slug, &input.prompt).await?;
    Ok(Json(DataResponse { data: item }))
}
