/// Domain error taxonomy shared by the store, the pipeline and the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced brand, project, work item, job, run or image does not exist.
    #[error("Entity not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input, rejected before anything is persisted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A uniqueness rule or a lifecycle transition rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The generator exited non-zero, timed out, or its output was unreadable.
    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a [`CoreError::NotFound`] for any displayable identifier
    /// (numeric ids and slugs alike).
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_accepts_slugs_and_ids() {
        assert_eq!(
            CoreError::not_found("Job", 42).to_string(),
            "Entity not found: Job 42"
        );
        assert_eq!(
            CoreError::not_found("Project", "demo").to_string(),
            "Entity not found: Project demo"
        );
    }
}
