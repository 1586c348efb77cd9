//! Feature Aggregate

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Feature;
pub use repository::FeatureRepository;
pub use api::{features_router, FeaturesState, FeatureResponse};
