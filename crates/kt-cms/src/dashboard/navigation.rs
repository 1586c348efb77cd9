//! Dashboard menu, filtered by session permissions

use serde::Serialize;
use utoipa::ToSchema;

use crate::permissions;
use crate::shared::authorization_service::AuthContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
    pub icon: &'static str,
    /// `None` means every dashboard user sees it
    pub permission: Option<&'static str>,
}

pub const NAV_ITEMS: [NavItem; 8] = [
    NavItem { title: "Dashboard", href: "/dashboard", icon: "home", permission: None },
    NavItem { title: "Perfiles", href: "/dashboard/profiles", icon: "user-circle", permission: Some(permissions::MANAGE_PROFILES) },
    NavItem { title: "Usuarios", href: "/dashboard/users", icon: "users", permission: Some(permissions::MANAGE_USERS) },
    NavItem { title: "Roles", href: "/dashboard/roles", icon: "shield", permission: Some(permissions::MANAGE_ROLES) },
    NavItem { title: "Servicios", href: "/dashboard/services", icon: "globe", permission: Some(permissions::MANAGE_CONTENT) },
    NavItem { title: "Proyectos", href: "/dashboard/projects", icon: "briefcase", permission: Some(permissions::MANAGE_CONTENT) },
    NavItem { title: "Paquetes", href: "/dashboard/packages", icon: "package", permission: Some(permissions::MANAGE_CONTENT) },
    NavItem { title: "Características", href: "/dashboard/features", icon: "settings", permission: Some(permissions::MANAGE_CONTENT) },
];

impl NavItem {
    pub fn visible_to(&self, session: &AuthContext) -> bool {
        self.permission.map_or(true, |p| session.has_permission(p))
    }

    /// Highlighted for the current path
    pub fn is_active(&self, path: &str) -> bool {
        path == self.href
            || (self.href != "/dashboard"
                && path.strip_prefix(self.href).is_some_and(|rest| rest.starts_with('/')))
    }
}

pub fn navigation_for(session: &AuthContext) -> Vec<NavItem> {
    NAV_ITEMS.iter().copied().filter(|item| item.visible_to(session)).collect()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavItemResponse {
    pub title: String,
    pub href: String,
    pub icon: String,
    pub permission: Option<String>,
}

impl From<NavItem> for NavItemResponse {
    fn from(item: NavItem) -> Self {
        Self {
            title: item.title.to_string(),
            href: item.href.to_string(),
            icon: item.icon.to_string(),
            permission: item.permission.map(String::from),
        }
    }
}
