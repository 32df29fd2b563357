//! Route definitions for the `/projects` resource.
//!
//! Also nests work item routes, including enqueue and per-item polling,
//! under `/projects/{slug}/work-items`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{images, jobs, project, work_item};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                   -> list
/// POST   /                                   -> create
/// GET    /{slug}                             -> get_by_slug
/// DELETE /{slug}                             -> delete
///
/// GET    /{slug}/work-items                  -> list
/// POST   /{slug}/work-items                  -> create
/// GET    /{slug}/work-items/{item}           -> get
/// PUT    /{slug}/work-items/{item}/prompt    -> update_prompt
/// POST   /{slug}/work-items/{item}/generate  -> enqueue
/// GET    /{slug}/work-items/{item}/jobs      -> list_for_work_item
/// GET    /{slug}/work-items/{item}/images    -> list_for_work_item
/// ```
pub fn router() -> Router<AppState> {
    let work_item_routes = Router::new()
        .route("/", get(work_item::list).post(work_item::create))
        .route("/{item}", get(work_item::get))
        .route("/{item}/prompt", put(work_item::update_prompt))
        .route("/{item}/generate", post(jobs::enqueue))
        .route("/{item}/jobs", get(jobs::list_for_work_item))
        .route("/{item}/images", get(images::list_for_work_item));

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{slug}", get(project::get_by_slug).delete(project::delete))
        .nest("/{slug}/work-items", work_item_routes)
}
