//! Handlers for the `/brands` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use imagegen_core::error::CoreError;
use imagegen_db::models::brand::{Brand, CreateBrand, UpdateBrand};
use imagegen_db::repositories::BrandRepo;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/brands
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateBrand>,
) -> AppResult<(StatusCode, Json<DataResponse<Brand>>)> {
    let brand = BrandRepo::create(&state.pool, &input).await?;
    tracing::info!(slug = %brand.slug, "Brand created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: brand })))
}

/// GET /api/v1/brands
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Brand>>>> {
    let brands = BrandRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: brands }))
}

/// GET /api/v1/brands/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Brand>>> {
    let brand = BrandRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Brand", &slug))?;
    Ok(Json(DataResponse { data: brand }))
}

/// PUT /api/v1/brands/{slug}
pub async fn update(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    JsonBody(input): JsonBody<UpdateBrand>,
) -> AppResult<Json<DataResponse<Brand>>> {
    let brand = BrandRepo::update_content(&state.pool, &slug, &input.content).await?;
    Ok(Json(DataResponse { data: brand }))
}

/// DELETE /api/v1/brands/{slug}
pub async fn delete(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    BrandRepo::delete(&state.pool, &slug).await?;
    tracing::info!(%slug, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}
