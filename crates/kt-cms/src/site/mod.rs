//! Public Site
//!
//! Server-rendered marketing pages built from the content aggregates.

pub mod seo;
pub mod render;
pub mod api;

pub use api::{site_router, SiteState};
pub use seo::{Metadata, Page};
