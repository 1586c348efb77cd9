//! Profile Aggregate
//!
//! Team-member cards, each owned by one user.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::{Profile, ProfileLinks};
pub use repository::ProfileRepository;
pub use api::{profiles_router, ProfilesState, ProfileResponse};
