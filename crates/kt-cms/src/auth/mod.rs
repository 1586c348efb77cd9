//! Authentication
//!
//! Session tokens, password hashing and the login endpoints.

pub mod auth_service;
pub mod auth_api;
pub mod password_service;

pub use auth_service::{AuthService, SessionClaims};
pub use auth_api::{auth_router, AuthState};
pub use password_service::PasswordService;
