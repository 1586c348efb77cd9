//! User Aggregate
//!
//! Staff accounts that can sign in to the dashboard.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::User;
pub use repository::UserRepository;
pub use api::{users_router, UsersState, UserResponse};
