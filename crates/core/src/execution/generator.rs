//! The `imagegen` command-line generator.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::executor::{ExecutionOutput, ExecutorError, GenerationExecutor, GenerationRequest};
use super::subprocess;

/// Binary looked up in the working directory before falling back to `PATH`.
pub const LOCAL_GENERATOR: &str = "./imagegen";

/// Binary name resolved through `PATH`.
pub const PATH_GENERATOR: &str = "imagegen";

/// Executor that runs `<binary> generate ...` as a subprocess.
#[derive(Debug, Clone)]
pub struct CliGenerator {
    binary: PathBuf,
}

impl CliGenerator {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// `./imagegen` when it exists, otherwise `imagegen` from `PATH`.
    pub fn resolve_default() -> Self {
        if Path::new(LOCAL_GENERATOR).exists() {
            Self::new(LOCAL_GENERATOR)
        } else {
            Self::new(PATH_GENERATOR)
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Build the argument list for one request.
///
/// `-aspect-ratio` is omitted when empty and `-brand-dir` when no brand
/// context applies.
pub fn build_args(request: &GenerationRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "generate".into(),
        "-prompt".into(),
        request.prompt.clone().into(),
        "-model".into(),
        request.model.clone().into(),
        "-out".into(),
        request.output_dir.clone().into(),
        "-image-size".into(),
        request.image_size.clone().into(),
        "-n".into(),
        request.count.to_string().into(),
        "-output-format".into(),
        request.output_format.as_str().into(),
    ];
    if !request.aspect_ratio.is_empty() {
        args.push("-aspect-ratio".into());
        args.push(request.aspect_ratio.clone().into());
    }
    if let Some(dir) = &request.brand_dir {
        args.push("-brand-dir".into());
        args.push(dir.clone().into());
    }
    args
}

impl GenerationExecutor for CliGenerator {
    async fn execute(&self, request: &GenerationRequest) -> Result<ExecutionOutput, ExecutorError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(build_args(request));
        tracing::debug!(
            binary = %self.binary.display(),
            output_dir = %request.output_dir.display(),
            "Invoking generator",
        );
        subprocess::run_command(&mut cmd, request.timeout).await
    }
}
