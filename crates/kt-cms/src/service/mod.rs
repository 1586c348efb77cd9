//! Service Aggregate

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Service;
pub use repository::ServiceRepository;
pub use api::{services_router, ServicesState, ServiceResponse};
