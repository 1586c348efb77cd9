//! Role Aggregate
//!
//! Roles and the permission tokens they grant.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::{permissions, Role};
pub use repository::RoleRepository;
pub use api::{roles_router, RolesState};
