//! Package Aggregate
//!
//! Pricing plans.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::{Package, PackageFeature};
pub use repository::PackageRepository;
pub use api::{packages_router, PackagesState, PackageResponse};
