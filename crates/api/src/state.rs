use std::sync::Arc;

use imagegen_pipeline::DataRoot;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference counted and the config is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: imagegen_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Resolves stored image paths for the image endpoint.
    pub data_root: DataRoot,
}
