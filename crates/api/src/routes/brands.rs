//! Route definitions for the `/brands` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::brand;
use crate::state::AppState;

/// Routes mounted at `/brands`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /{slug}    -> get_by_slug
/// PUT    /{slug}    -> update
/// DELETE /{slug}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(brand::list).post(brand::create))
        .route(
            "/{slug}",
            get(brand::get_by_slug)
                .put(brand::update)
                .delete(brand::delete),
        )
}
