//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?limit=` for listings. Defaults and the upper cap are applied in the
/// repository layer via `clamp_limit`.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}
