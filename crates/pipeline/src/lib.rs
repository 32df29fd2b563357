//! Execution of claimed generation jobs.
//!
//! [`worker::JobWorker`] polls the store, claims one job at a time, runs the
//! generator into a fresh directory under the [`storage::DataRoot`], records
//! the harvested images, and drives the job and its run to a terminal state.

pub mod config;
pub mod harvest;
pub mod storage;
pub mod worker;

pub use config::WorkerConfig;
pub use storage::DataRoot;
pub use worker::{CycleOutcome, JobWorker, WorkerHandle};
