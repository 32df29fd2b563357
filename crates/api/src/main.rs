use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use imagegen_db::repositories::JobRepo;
use imagegen_db::DbConfig;
use imagegen_pipeline::{DataRoot, JobWorker, WorkerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagegen_api::config::ServerConfig;
use imagegen_api::router::build_app_router;
use imagegen_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "imagegen_api=debug,imagegen_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_root = %config.data_root.display(),
        "Loaded server configuration",
    );

    let data_root = DataRoot::new(&config.data_root);
    data_root
        .ensure_exists()
        .await
        .expect("Failed to create data root");

    // --- Database ---
    let pool = imagegen_db::create_pool(&data_root.database_path(), &DbConfig::from_env())
        .await
        .expect("Failed to open database");
    tracing::info!("Database connection pool created");

    imagegen_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    imagegen_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    match JobRepo::count_running(&pool).await {
        Ok(0) => {}
        Ok(count) => tracing::warn!(
            count,
            "Jobs left running by a previous process; they will not be resumed",
        ),
        Err(e) => tracing::error!(error = %e, "Failed to count running jobs"),
    }

    // --- Worker ---
    let generator = worker_config.generator();
    tracing::info!(generator = %generator.binary().display(), "Using generator binary");
    let worker = JobWorker::new(pool.clone(), data_root.clone(), generator, worker_config).start();

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        data_root,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, stopping worker");

    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(timeout, worker.stop()).await.is_err() {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Worker did not stop in time; its job stays running",
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
