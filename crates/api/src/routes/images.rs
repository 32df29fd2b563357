use axum::routing::get;
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// GET /{id}    -> serve
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(images::serve))
}
