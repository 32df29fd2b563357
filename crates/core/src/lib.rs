//! Pure domain logic for the image generation pipeline.
//!
//! Nothing in this crate touches the database. It holds the shared id and
//! timestamp types, the error taxonomy, slug normalization, generation
//! settings validation, recognized image formats, and the executor boundary
//! used to invoke the external generator.

pub mod error;
pub mod execution;
pub mod formats;
pub mod generation;
pub mod naming;
pub mod types;
