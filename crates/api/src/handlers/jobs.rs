//! Handlers for the enqueue path and the job polling surface.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use imagegen_core::error::CoreError;
use imagegen_core::generation::GenerationSettingsInput;
use imagegen_core::types::DbId;
use imagegen_db::models::job::Job;
use imagegen_db::repositories::JobRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::handlers::images::ImageView;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Polling payload: the job, the images harvested so far and whether the
/// job has reached a terminal state.
#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    pub images: Vec<ImageView>,
    pub terminal: bool,
}

/// POST /api/v1/projects/{slug}/work-items/{item}/generate
///
/// Validates the settings and queues a job. The worker picks it up on its
/// next tick; clients poll `GET /api/v1/jobs/{id}`.
pub async fn enqueue(
    State(state): State<AppState>,
    Path((project_slug, item_slug)): Path<(String, String)>,
    JsonBody(input): JsonBody<GenerationSettingsInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Job>>)> {
    let job = JobRepo::enqueue(&state.pool, &project_slug, &item_slug, &input).await?;
    tracing::info!(job_id = job.id, project = %project_slug, work_item = %item_slug, "Job queued");
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// GET /api/v1/jobs?limit=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let jobs = JobRepo::list(&state.pool, params.limit).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobView>>> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Job", id))?;
    let images = JobRepo::job_images(&state.pool, id)
        .await?
        .into_iter()
        .map(ImageView::from)
        .collect();
    let terminal = job.status.is_terminal();

    Ok(Json(DataResponse {
        data: JobView {
            job,
            images,
            terminal,
        },
    }))
}

/// GET /api/v1/projects/{slug}/work-items/{item}/jobs?limit=
pub async fn list_for_work_item(
    State(state): State<AppState>,
    Path((project_slug, item_slug)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let jobs =
        JobRepo::list_for_work_item(&state.pool, &project_slug, &item_slug, params.limit).await?;
    Ok(Json(DataResponse { data: jobs }))
}
