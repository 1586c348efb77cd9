//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod error;
pub mod tsid;
pub mod validation;
pub mod middleware;
pub mod api_common;
pub mod indexes;

// APIs
pub mod health_api;

// Services
pub mod authorization_service;

pub use error::{PlatformError, Result};
pub use tsid::TsidGenerator;
pub use middleware::{AppState, AuthLayer, Authenticated, OptionalAuth};
pub use api_common::{ActiveFilter, ApiJson, MessageResponse, PaginationMeta, PaginationParams};
pub use health_api::{health_router, HealthState};
pub use authorization_service::{authorize, checks, AuthContext};
