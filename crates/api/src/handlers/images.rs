//! Handlers for harvested images.

use std::io;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagegen_core::error::CoreError;
use imagegen_core::formats::ImageFormat;
use imagegen_core::types::{DbId, Timestamp};
use imagegen_db::models::run_image::RunImage;
use imagegen_db::repositories::RunImageRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Public view of a run image. The stored path stays internal; clients
/// fetch bytes through `url`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: DbId,
    pub run_id: DbId,
    pub filename: String,
    pub format: String,
    pub url: String,
    pub created_at: Timestamp,
}

impl From<RunImage> for ImageView {
    fn from(image: RunImage) -> Self {
        Self {
            url: format!("/api/v1/images/{}", image.id),
            id: image.id,
            run_id: image.run_id,
            filename: image.filename,
            format: image.format,
            created_at: image.created_at,
        }
    }
}

/// GET /api/v1/projects/{slug}/work-items/{item}/images?limit=
pub async fn list_for_work_item(
    State(state): State<AppState>,
    Path((project_slug, item_slug)): Path<(String, String)>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<ImageView>>>> {
    let images =
        RunImageRepo::list_for_work_item(&state.pool, &project_slug, &item_slug, params.limit)
            .await?;
    Ok(Json(DataResponse {
        data: images.into_iter().map(ImageView::from).collect(),
    }))
}

/// GET /api/v1/images/{id}
///
/// Returns the file bytes with a content type derived from the extension.
pub async fn serve(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Response> {
    let path = state.data_root.image_path(&state.pool, id).await?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(image_id = id, path = %path.display(), "Image file missing");
            return Err(CoreError::not_found("Image file", id).into());
        }
        Err(e) => {
            return Err(AppError::InternalError(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let content_type = ImageFormat::from_path(&path)
        .map(ImageFormat::content_type)
        .unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
