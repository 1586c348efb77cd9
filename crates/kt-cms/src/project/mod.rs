//! Project Aggregate
//!
//! Portfolio entries.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Project;
pub use repository::ProjectRepository;
pub use api::{projects_router, ProjectsState, ProjectResponse};
