//! Integration tests for the worker cycle against a real database and a fake
//! generator that writes files into the requested output directory.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use imagegen_core::execution::{
    ExecutionOutput, ExecutorError, GenerationExecutor, GenerationRequest,
};
use imagegen_core::formats::ImageFormat;
use imagegen_core::generation::GenerationSettingsInput;
use imagegen_db::models::brand::CreateBrand;
use imagegen_db::models::project::CreateProject;
use imagegen_db::models::status::{JobStatus, RunStatus};
use imagegen_db::models::work_item::CreateWorkItem;
use imagegen_db::repositories::{BrandRepo, JobRepo, ProjectRepo, RunRepo, WorkItemRepo};
use imagegen_pipeline::{CycleOutcome, DataRoot, JobWorker, WorkerConfig};
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Fake generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Behaviour {
    /// Write the named files and exit 0.
    Write(Vec<&'static str>),
    /// Write the named files, print `output` and exit with `code`.
    Exit {
        code: i32,
        files: Vec<&'static str>,
        output: &'static str,
    },
    Timeout,
    /// Never finish.
    Hang,
}

/// What the generator observed while it ran.
#[derive(Debug, Clone)]
struct Seen {
    prompt: String,
    count: u32,
    output_dir: PathBuf,
    brand_dir: Option<PathBuf>,
    brand_text: Option<String>,
}

#[derive(Clone)]
struct FakeGenerator {
    behaviour: Behaviour,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl FakeGenerator {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl GenerationExecutor for FakeGenerator {
    async fn execute(
        &self,
        request: &GenerationRequest,
    ) -> Result<ExecutionOutput, ExecutorError> {
        let brand_text = request
            .brand_dir
            .as_ref()
            .map(|dir| std::fs::read_to_string(dir.join("BRAND.md")).unwrap());
        self.seen.lock().unwrap().push(Seen {
            prompt: request.prompt.clone(),
            count: request.count,
            output_dir: request.output_dir.clone(),
            brand_dir: request.brand_dir.clone(),
            brand_text,
        });

        let write = |files: &[&str]| {
            for name in files {
                std::fs::write(request.output_dir.join(name), b"img").unwrap();
            }
        };

        match &self.behaviour {
            Behaviour::Write(files) => {
                write(files);
                Ok(ExecutionOutput {
                    exit_code: 0,
                    output: String::new(),
                    duration_ms: 1,
                })
            }
            Behaviour::Exit {
                code,
                files,
                output,
            } => {
                write(files);
                Ok(ExecutionOutput {
                    exit_code: *code,
                    output: output.to_string(),
                    duration_ms: 1,
                })
            }
            Behaviour::Timeout => Err(ExecutorError::Timeout {
                elapsed_ms: request.timeout.as_millis() as u64,
            }),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Project `demo` with work item `icon` (prompt `p`), optionally branded.
async fn seed(pool: &SqlitePool, brand: Option<&str>) {
    if let Some(content) = brand {
        BrandRepo::create(
            pool,
            &CreateBrand {
                name: "House".into(),
                content: content.into(),
            },
        )
        .await
        .unwrap();
    }
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: "demo".into(),
            default_brand_slug: brand.map(|_| "house".to_string()),
        },
    )
    .await
    .unwrap();
    WorkItemRepo::create(
        pool,
        "demo",
        &CreateWorkItem {
            name: "icon".into(),
            item_type: None,
            prompt: "p".into(),
            brand_slug: None,
        },
    )
    .await
    .unwrap();
}

async fn enqueue(pool: &SqlitePool, input: GenerationSettingsInput) -> i64 {
    JobRepo::enqueue(pool, "demo", "icon", &input).await.unwrap().id
}

fn png(count: u32) -> GenerationSettingsInput {
    GenerationSettingsInput {
        count: Some(count),
        output_format: Some("png".into()),
        ..Default::default()
    }
}

fn worker(
    pool: &SqlitePool,
    root: &tempfile::TempDir,
    generator: FakeGenerator,
) -> JobWorker<FakeGenerator> {
    worker_with_timeout(pool, root, generator, Duration::from_secs(1))
}

fn worker_with_timeout(
    pool: &SqlitePool,
    root: &tempfile::TempDir,
    generator: FakeGenerator,
    generation_timeout: Duration,
) -> JobWorker<FakeGenerator> {
    let config = WorkerConfig {
        poll_interval: Duration::from_millis(10),
        generation_timeout,
        generator_bin: None,
    };
    JobWorker::new(pool.clone(), DataRoot::new(root.path()), generator, config)
}

/// Make every update of a run to `status` abort with `message`.
async fn reject_run_status(pool: &SqlitePool, status: &str, message: &str) {
    let sql = format!(
        "CREATE TRIGGER reject_run_{status} BEFORE UPDATE OF status ON runs \
         WHEN NEW.status = '{status}' \
         BEGIN SELECT RAISE(ABORT, '{message}'); END"
    );
    sqlx::query(&sql).execute(pool).await.unwrap();
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn idle_when_nothing_is_queued(pool: SqlitePool) {
    seed(&pool, None).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Write(vec![]));

    let outcome = worker(&pool, &root, generator.clone()).run_once().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Idle);
    assert!(generator.seen().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn successful_job_records_every_image(pool: SqlitePool) {
    seed(&pool, None).await;
    let job_id = enqueue(&pool, png(2)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Write(vec!["a.png", "b.png", "log.txt"]));
    let worker = worker(&pool, &root, generator.clone());

    let outcome = worker.run_once().await.unwrap();

    let run = RunRepo::find_by_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(
        outcome,
        CycleOutcome::Succeeded {
            job_id,
            run_id: run.id,
            images: 2
        }
    );
    assert_eq!(run.prompt_snapshot, "p");
    assert_eq!(run.status, RunStatus::Succeeded);

    let seen = generator.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].prompt, "p");
    assert_eq!(seen[0].count, 2);
    assert_eq!(
        seen[0].output_dir,
        root.path().join(format!("images/demo/icon/run-{}", run.id))
    );
    assert!(seen[0].brand_dir.is_none());

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.run_id, Some(run.id));

    let images = JobRepo::job_images(&pool, job_id).await.unwrap();
    let names: Vec<_> = images.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, ["a.png", "b.png"]);
    assert!(images.iter().all(|i| i.format == ImageFormat::Png.as_str()));

    let data_root = DataRoot::new(root.path());
    let path = data_root.image_path(&pool, images[0].id).await.unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"img");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn adjustment_is_appended_to_prompt(pool: SqlitePool) {
    seed(&pool, None).await;
    enqueue(
        &pool,
        GenerationSettingsInput {
            adjustment: Some("darker".into()),
            ..png(1)
        },
    )
    .await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Write(vec!["a.png"]));

    worker(&pool, &root, generator.clone()).run_once().await.unwrap();

    assert_eq!(generator.seen()[0].prompt, "p\n\nAdjustments:\ndarker");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn nonzero_exit_fails_without_harvesting(pool: SqlitePool) {
    seed(&pool, None).await;
    let job_id = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Exit {
        code: 3,
        files: vec!["partial.png"],
        output: "quota exceeded\n",
    });

    let outcome = worker(&pool, &root, generator).run_once().await.unwrap();

    let run = RunRepo::find_by_job(&pool, job_id).await.unwrap().unwrap();
    assert_matches!(
        outcome,
        CycleOutcome::Failed { job_id: id, run_id: Some(r), ref message }
            if id == job_id && r == run.id && message.contains("quota exceeded")
    );
    assert_eq!(run.status, RunStatus::Failed);

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let message = job.error_message.unwrap();
    assert!(message.contains("status 3"), "{message}");
    assert!(message.contains("quota exceeded"), "{message}");

    assert!(JobRepo::job_images(&pool, job_id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn executor_timeout_error_fails_the_job(pool: SqlitePool) {
    seed(&pool, None).await;
    let job_id = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();

    let outcome = worker(&pool, &root, FakeGenerator::new(Behaviour::Timeout))
        .run_once()
        .await
        .unwrap();

    assert_matches!(outcome, CycleOutcome::Failed { ref message, .. } if message.contains("timed out"));
    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hung_generator_is_cut_off_by_generation_timeout(pool: SqlitePool) {
    seed(&pool, Some("Use teal.")).await;
    let job_id = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Hang);
    let worker = worker_with_timeout(&pool, &root, generator.clone(), Duration::from_millis(100));

    let outcome = tokio::time::timeout(Duration::from_secs(5), worker.run_once())
        .await
        .expect("cycle should end once the generation timeout fires")
        .unwrap();

    assert_matches!(outcome, CycleOutcome::Failed { ref message, .. } if message.contains("timed out"));
    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let run = RunRepo::find_by_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(!generator.seen()[0].brand_dir.as_ref().unwrap().exists());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn brand_context_is_removed_after_success(pool: SqlitePool) {
    seed(&pool, Some("Use teal.")).await;
    enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Write(vec!["a.png"]));

    worker(&pool, &root, generator.clone()).run_once().await.unwrap();

    let seen = &generator.seen()[0];
    assert_eq!(seen.brand_text.as_deref(), Some("Use teal."));
    let brand_dir = seen.brand_dir.as_ref().unwrap();
    assert!(!brand_dir.exists());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn brand_context_is_removed_after_failure(pool: SqlitePool) {
    seed(&pool, Some("Use teal.")).await;
    enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Exit {
        code: 1,
        files: vec![],
        output: "boom",
    });

    let outcome = worker(&pool, &root, generator.clone()).run_once().await.unwrap();

    assert_matches!(outcome, CycleOutcome::Failed { .. });
    let seen = &generator.seen()[0];
    assert!(seen.brand_text.is_some());
    assert!(!seen.brand_dir.as_ref().unwrap().exists());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn jobs_are_executed_in_queue_order(pool: SqlitePool) {
    seed(&pool, None).await;
    let first = enqueue(&pool, png(1)).await;
    let second = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let worker = worker(&pool, &root, FakeGenerator::new(Behaviour::Write(vec!["a.png"])));

    assert_matches!(worker.run_once().await.unwrap(), CycleOutcome::Succeeded { job_id, .. } if job_id == first);
    assert_matches!(worker.run_once().await.unwrap(), CycleOutcome::Succeeded { job_id, .. } if job_id == second);
    assert_eq!(worker.run_once().await.unwrap(), CycleOutcome::Idle);
}

// ---------------------------------------------------------------------------
// Store errors after a claim
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn store_error_on_success_path_still_fails_the_job(pool: SqlitePool) {
    seed(&pool, None).await;
    let job_id = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let worker = worker(&pool, &root, FakeGenerator::new(Behaviour::Write(vec!["a.png"])));
    reject_run_status(&pool, "succeeded", "disk full").await;

    let err = worker.run_once().await.unwrap_err();
    assert!(err.to_string().contains("disk full"), "{err}");

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("disk full"));
    let run = RunRepo::find_by_job(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);

    assert_eq!(worker.run_once().await.unwrap(), CycleOutcome::Idle);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn job_is_failed_even_when_run_update_fails(pool: SqlitePool) {
    seed(&pool, None).await;
    let job_id = enqueue(&pool, png(1)).await;
    let root = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::new(Behaviour::Exit {
        code: 1,
        files: vec![],
        output: "boom",
    });
    let worker = worker(&pool, &root, generator);
    reject_run_status(&pool, "failed", "disk full").await;

    assert!(worker.run_once().await.is_err());

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("boom"));
}

// ---------------------------------------------------------------------------
// Loop lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn started_worker_processes_queue_and_stops(pool: SqlitePool) {
    seed(&pool, None).await;
    let root = tempfile::tempdir().unwrap();
    let handle = worker(&pool, &root, FakeGenerator::new(Behaviour::Write(vec!["a.png"]))).start();

    let job_id = enqueue(&pool, png(1)).await;

    let status = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
            if job.status.is_terminal() {
                return job.status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("job should finish");
    assert_eq!(status, JobStatus::Succeeded);
    assert!(!handle.is_finished());

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("worker should stop");
}
