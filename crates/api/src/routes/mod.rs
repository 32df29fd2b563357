pub mod brands;
pub mod health;
pub mod images;
pub mod jobs;
pub mod projects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /brands                                           list, create
/// /brands/{slug}                                    get, update content, delete
///
/// /projects                                         list, create
/// /projects/{slug}                                  get, delete
/// /projects/{slug}/work-items                       list, create
/// /projects/{slug}/work-items/{item}                get
/// /projects/{slug}/work-items/{item}/prompt         update prompt (PUT)
/// /projects/{slug}/work-items/{item}/generate       enqueue (POST, 202)
/// /projects/{slug}/work-items/{item}/jobs           recent jobs
/// /projects/{slug}/work-items/{item}/images         recent images
///
/// /jobs                                             list (?limit=)
/// /jobs/{id}                                        polling view
///
/// /images/{id}                                      raw image bytes
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/brands", brands::router())
        .nest("/projects", projects::router())
        .nest("/jobs", jobs::router())
        .nest("/images", images::router())
}
