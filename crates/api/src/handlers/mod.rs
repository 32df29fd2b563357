pub mod brand;
pub mod images;
pub mod jobs;
pub mod project;
pub mod work_item;
