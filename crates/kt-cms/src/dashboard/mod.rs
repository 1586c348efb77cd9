//! Admin Dashboard
//!
//! Role gate, permission-filtered navigation and record counts.

pub mod gate;
pub mod navigation;
pub mod api;

pub use gate::{gate, DashboardSession, GateDecision};
pub use navigation::{navigation_for, NavItem};
pub use api::{dashboard_api_router, dashboard_pages_router, DashboardState, DashboardStats};
