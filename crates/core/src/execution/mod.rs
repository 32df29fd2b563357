//! Invocation of the external image generator.
//!
//! The pipeline treats generation as an opaque command with a file-system
//! contract: it receives a prompt and settings, writes image files into an
//! output directory, and exits 0 on success. [`GenerationExecutor`] is the
//! seam; [`CliGenerator`] is the subprocess implementation.

pub mod brand;
pub mod executor;
pub mod generator;
pub mod subprocess;

pub use brand::BrandContext;
pub use executor::{ExecutionOutput, ExecutorError, GenerationExecutor, GenerationRequest};
pub use generator::CliGenerator;
