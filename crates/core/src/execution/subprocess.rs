//! Spawn, capture and timeout handling for generator subprocesses.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{ExecutionOutput, ExecutorError};

/// Maximum bytes captured per stream (1 MiB). Anything beyond is dropped.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Spawn `cmd`, capture stdout and stderr, and wait at most `timeout`.
///
/// Stdin is closed. On timeout the child is killed (it is spawned with
/// `kill_on_drop`) and [`ExecutorError::Timeout`] is returned.
pub async fn run_command(
    cmd: &mut Command,
    timeout: Duration,
) -> Result<ExecutionOutput, ExecutorError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            ExecutorError::NotFound(cmd.as_std().get_program().to_string_lossy().into_owned())
        }
        _ => ExecutorError::Io(e),
    })?;

    // Drain both pipes while waiting on the child.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    match wait_result {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let mut combined = stdout_task.await.unwrap_or_default();
            combined.extend(stderr_task.await.unwrap_or_default());

            Ok(ExecutionOutput {
                exit_code: status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&combined).into_owned(),
                duration_ms,
            })
        }
        Ok(Err(e)) => Err(ExecutorError::Io(e)),
        Err(_elapsed) => {
            // Dropping `child` kills it.
            drop(child);
            stdout_task.abort();
            stderr_task.abort();
            Err(ExecutorError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}
