//! The background worker loop.
//!
//! A single long-lived Tokio task that, every `poll_interval`, claims at most
//! one queued job and drives it to a terminal state before polling again.
//! Claiming goes through [`JobRepo::claim_next`], which is atomic even if
//! several workers ever share a database.

use std::fmt::Display;

use imagegen_core::error::CoreError;
use imagegen_core::execution::{
    BrandContext, ExecutorError, GenerationExecutor, GenerationRequest,
};
use imagegen_core::generation::build_prompt_snapshot;
use imagegen_core::types::DbId;
use imagegen_db::models::job::ClaimedJob;
use imagegen_db::models::run::CreateRun;
use imagegen_db::models::run_image::CreateRunImage;
use imagegen_db::repositories::{JobRepo, RunImageRepo, RunRepo};
use imagegen_db::{DbPool, RepoError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::harvest::scan_output_dir;
use crate::storage::DataRoot;

/// Result of one claim-and-execute cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was queued.
    Idle,
    /// The generator succeeded and `images` files were recorded.
    Succeeded {
        job_id: DbId,
        run_id: DbId,
        images: usize,
    },
    /// The job ended `failed`. `run_id` is `None` if the run could not be
    /// created.
    Failed {
        job_id: DbId,
        run_id: Option<DbId>,
        message: String,
    },
}

/// Claims queued jobs and executes them with `E`.
pub struct JobWorker<E> {
    pool: DbPool,
    data_root: DataRoot,
    executor: E,
    config: WorkerConfig,
}

impl<E: GenerationExecutor + 'static> JobWorker<E> {
    pub fn new(pool: DbPool, data_root: DataRoot, executor: E, config: WorkerConfig) -> Self {
        Self {
            pool,
            data_root,
            executor,
            config,
        }
    }

    /// Spawn the polling loop. The returned handle stops it.
    pub fn start(self) -> WorkerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { self.run(token).await });
        WorkerHandle { cancel, handle }
    }

    /// Run the polling loop until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles, so a job being executed
    /// always reaches a terminal state first. Store errors are logged and the
    /// loop tries again on the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        // A long generation must not be followed by a burst of catch-up ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Job worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(CycleOutcome::Idle) => {}
                        Ok(CycleOutcome::Succeeded { job_id, run_id, images }) => {
                            tracing::info!(job_id, run_id, images, "Job succeeded");
                        }
                        Ok(CycleOutcome::Failed { job_id, run_id, message }) => {
                            tracing::warn!(job_id, ?run_id, %message, "Job failed");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Worker cycle failed");
                        }
                    }
                }
            }
        }
    }

    /// Claim and fully execute at most one job.
    ///
    /// A store error after the claim is returned to the caller, but only
    /// after a best-effort attempt to move the job and its run to `failed`,
    /// since a `running` job is never claimed again.
    pub async fn run_once(&self) -> Result<CycleOutcome, RepoError> {
        let Some(claimed) = JobRepo::claim_next(&self.pool).await? else {
            return Ok(CycleOutcome::Idle);
        };
        tracing::info!(
            job_id = claimed.job_id,
            project = %claimed.project_slug,
            work_item = %claimed.work_item_slug,
            "Job claimed",
        );
        let job_id = claimed.job_id;
        match self.execute(claimed).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.abandon(job_id, &e).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, job: ClaimedJob) -> Result<CycleOutcome, RepoError> {
        let settings = job.settings;
        let prompt = build_prompt_snapshot(&job.prompt, &settings.adjustment);

        let run = match RunRepo::create(
            &self.pool,
            &CreateRun {
                job_id: job.job_id,
                prompt_snapshot: prompt.clone(),
                settings_snapshot: settings.clone(),
            },
        )
        .await
        {
            Ok(run) => run,
            Err(e) => return self.fail(job.job_id, None, e).await,
        };

        let rel_dir = DataRoot::run_relative_dir(&job.project_slug, &job.work_item_slug, run.id);
        let output_dir = self.data_root.resolve(&rel_dir);
        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            return self
                .fail(job.job_id, Some(run.id), format!("cannot create output directory: {e}"))
                .await;
        }

        let brand = match job.brand_content.as_deref().map(BrandContext::materialize) {
            None => None,
            Some(Ok(brand)) => brand,
            Some(Err(e)) => {
                return self
                    .fail(job.job_id, Some(run.id), format!("cannot write brand context: {e}"))
                    .await;
            }
        };

        let request = GenerationRequest {
            prompt,
            model: settings.model,
            output_dir: output_dir.clone(),
            image_size: settings.image_size,
            aspect_ratio: settings.aspect_ratio,
            count: settings.count,
            output_format: settings.output_format,
            brand_dir: brand.as_ref().map(|b| b.path().to_path_buf()),
            timeout: self.config.generation_timeout,
        };

        let limit = self.config.generation_timeout;
        let result = match tokio::time::timeout(limit, self.executor.execute(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::Timeout {
                elapsed_ms: limit.as_millis() as u64,
            }),
        };

        if let Some(brand) = brand {
            if let Err(e) = brand.close() {
                tracing::warn!(job_id = job.job_id, error = %e, "Failed to remove brand context");
            }
        }

        let failure = match result {
            Ok(output) if output.success() => None,
            Ok(output) => Some(format!(
                "generator exited with status {}\n{}",
                output.exit_code,
                output.output.trim()
            )),
            Err(e) => Some(e.to_string()),
        };
        if let Some(message) = failure {
            return self
                .fail(job.job_id, Some(run.id), CoreError::ExecutionFailure(message))
                .await;
        }

        let files = match scan_output_dir(&output_dir, &rel_dir).await {
            Ok(files) => files,
            Err(e) => {
                let err =
                    CoreError::ExecutionFailure(format!("cannot read output directory: {e}"));
                return self.fail(job.job_id, Some(run.id), err).await;
            }
        };

        let mut images = 0;
        for file in files {
            let input = CreateRunImage {
                run_id: run.id,
                filename: file.filename,
                rel_path: file.rel_path,
                format: file.format,
            };
            match RunImageRepo::create(&self.pool, &input).await {
                Ok(_) => images += 1,
                Err(e) => tracing::warn!(
                    run_id = run.id,
                    filename = %input.filename,
                    error = %e,
                    "Failed to record image",
                ),
            }
        }

        RunRepo::mark_succeeded(&self.pool, run.id).await?;
        JobRepo::mark_succeeded(&self.pool, job.job_id).await?;

        Ok(CycleOutcome::Succeeded {
            job_id: job.job_id,
            run_id: run.id,
            images,
        })
    }

    /// Move the run (if any) and the job to `failed` with `reason`.
    async fn fail(
        &self,
        job_id: DbId,
        run_id: Option<DbId>,
        reason: impl Display,
    ) -> Result<CycleOutcome, RepoError> {
        let message = reason.to_string();
        let run_result = match run_id {
            Some(run_id) => RunRepo::mark_failed(&self.pool, run_id, &message).await,
            None => Ok(()),
        };
        // The job is updated even if the run could not be.
        JobRepo::mark_failed(&self.pool, job_id, &message).await?;
        run_result?;
        Ok(CycleOutcome::Failed {
            job_id,
            run_id,
            message: message.trim().to_string(),
        })
    }

    /// Best-effort move of a claimed job, and its run if one exists, to
    /// `failed` after a store error interrupted its cycle. Failures here are
    /// only logged.
    async fn abandon(&self, job_id: DbId, cause: &RepoError) {
        let message = format!("Persistence failure: {cause}");

        match RunRepo::find_by_job(&self.pool, job_id).await {
            Ok(Some(run)) if !run.status.is_terminal() => {
                if let Err(e) = RunRepo::mark_failed(&self.pool, run.id, &message).await {
                    tracing::warn!(job_id, run_id = run.id, error = %e, "Failed to mark run failed");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(job_id, error = %e, "Failed to look up run"),
        }

        match JobRepo::find_by_id(&self.pool, job_id).await {
            Ok(Some(job)) if job.status.is_terminal() => {}
            _ => match JobRepo::mark_failed(&self.pool, job_id, &message).await {
                Ok(()) => tracing::warn!(job_id, error = %cause, "Job failed after store error"),
                Err(e) => tracing::error!(job_id, error = %e, "Job left running after store error"),
            },
        }
    }
}

/// Handle to a spawned worker loop.
pub struct WorkerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the loop to stop and wait for the in-flight cycle to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Job worker task panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
