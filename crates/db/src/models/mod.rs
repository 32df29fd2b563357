//! Entity structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching a (possibly joined) row
//! - A `Deserialize` create DTO for inserts

pub mod brand;
pub mod job;
pub mod project;
pub mod run;
pub mod run_image;
pub mod status;
pub mod work_item;
