//! Request extractors that reject with [`AppError`] instead of axum's
//! plain-text rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use imagegen_core::error::CoreError;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
///
/// A body that parses but does not fit `T` (wrong type, out-of-range
/// number, missing field) is a `Validation` error; any other rejection
/// (bad syntax, missing content type) is a `BadRequest`. Both render as
/// the usual `{"error", "code"}` 400 response.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(e)) => {
                Err(AppError::Core(CoreError::Validation(e.body_text())))
            }
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}
