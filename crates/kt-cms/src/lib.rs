//! Kothler CMS
//!
//! Marketing site with an attached content-management dashboard:
//! - Content aggregates (services, projects, packages, features, profiles)
//! - Staff users and roles with flat permission tokens
//! - Signed session tokens and a per-endpoint permission gate
//! - Read-through cache keyed by entity
//! - Server-rendered public pages with SEO metadata
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints

// Content aggregates
pub mod service;
pub mod project;
pub mod package;
pub mod feature;
pub mod profile;

// Identity aggregates
pub mod user;
pub mod role;

// Authentication & authorization
pub mod auth;

// Shared infrastructure
pub mod shared;
pub mod cache;

// Presentation
pub mod site;
pub mod dashboard;

pub mod seed;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export main entity types for convenience
pub use service::entity::Service;
pub use project::entity::Project;
pub use package::entity::{Package, PackageFeature};
pub use feature::entity::Feature;
pub use profile::entity::{Profile, ProfileLinks};
pub use user::entity::User;
pub use role::entity::{permissions, Role};

// Re-export repositories
pub use service::repository::ServiceRepository;
pub use project::repository::ProjectRepository;
pub use package::repository::PackageRepository;
pub use feature::repository::FeatureRepository;
pub use profile::repository::ProfileRepository;
pub use user::repository::UserRepository;
pub use role::repository::RoleRepository;

// Re-export services
pub use auth::password_service::PasswordService;
pub use auth::auth_service::{AuthService, SessionClaims};
pub use cache::{CacheEntity, CacheService};
pub use shared::authorization_service::{AuthContext, checks};
