//! Executor boundary and shared request/output types.

use std::path::PathBuf;
use std::time::Duration;

use crate::formats::ImageFormat;

/// Everything the generator needs for one execution attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Prompt already merged with any adjustment text.
    pub prompt: String,
    pub model: String,
    /// Existing, writable directory the generator writes images into.
    pub output_dir: PathBuf,
    pub image_size: String,
    /// Empty means "generator default".
    pub aspect_ratio: String,
    pub count: u32,
    pub output_format: ImageFormat,
    /// Directory holding the brand text file, when brand context applies.
    pub brand_dir: Option<PathBuf>,
    /// Wall-clock limit before the process is killed.
    pub timeout: Duration,
}

/// Captured result of a generator process that ran to completion.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Stdout followed by stderr.
    pub output: String,
    pub duration_ms: u64,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Failures that prevent the generator from running to completion.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Generator not found: {0}")]
    NotFound(String),

    #[error("Generator timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one generation request.
///
/// A returned [`ExecutionOutput`] with a non-zero exit code is still a
/// failed run; callers check [`ExecutionOutput::success`].
pub trait GenerationExecutor: Send + Sync {
    fn execute(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<ExecutionOutput, ExecutorError>> + Send;
}
