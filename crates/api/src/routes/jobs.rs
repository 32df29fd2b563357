//! Route definitions for the `/jobs` polling surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET /        -> list
/// GET /{id}    -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list))
        .route("/{id}", get(jobs::get_by_id))
}
