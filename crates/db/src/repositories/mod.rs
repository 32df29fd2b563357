//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` as the first argument.

pub mod brand_repo;
pub mod job_repo;
pub mod project_repo;
pub mod run_image_repo;
pub mod run_repo;
pub mod work_item_repo;

pub use brand_repo::BrandRepo;
pub use job_repo::JobRepo;
pub use project_repo::ProjectRepo;
pub use run_image_repo::RunImageRepo;
pub use run_repo::RunRepo;
pub use work_item_repo::WorkItemRepo;
