//! SQLite persistence for brands, projects, work items, jobs, runs and run
//! images.
//!
//! One database file lives under the data root. Every repository is a
//! zero-sized struct whose methods take `&DbPool` as the first argument.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub mod error;
pub mod models;
pub mod repositories;

pub use error::RepoError;

pub type DbPool = sqlx::SqlitePool;

/// File name of the database inside the data root.
pub const DATABASE_FILE_NAME: &str = "imagegen.db";

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool settings loaded from the environment.
///
/// | Env var                    | Default |
/// |----------------------------|---------|
/// | `DATABASE_MAX_CONNECTIONS` | `4`     |
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 4 }
    }
}

impl DbConfig {
    /// # Panics
    ///
    /// Panics if `DATABASE_MAX_CONNECTIONS` is set but is not a number.
    pub fn from_env() -> Self {
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .map(|v| {
                v.parse()
                    .expect("DATABASE_MAX_CONNECTIONS must be a valid u32")
            })
            .unwrap_or(Self::default().max_connections);
        Self { max_connections }
    }
}

/// Open (creating if needed) the database file at `path`.
///
/// Foreign keys are enforced, the journal runs in WAL mode, and writers wait
/// on a busy database instead of failing immediately.
pub async fn create_pool(path: &Path, config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Whether `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
