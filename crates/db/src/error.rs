use imagegen_core::error::CoreError;

/// Error returned by repository operations that enforce a domain rule.
///
/// Plain data access returns `sqlx::Error` directly; operations that can
/// fail with "not found", a uniqueness conflict, or an illegal lifecycle
/// transition return this instead.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Map a UNIQUE violation to [`CoreError::Conflict`] with `message`;
    /// any other error stays a database error.
    pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        if crate::is_unique_violation(&err) {
            Self::Core(CoreError::Conflict(message.into()))
        } else {
            Self::Database(err)
        }
    }
}
