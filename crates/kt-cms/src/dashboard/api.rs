//! Dashboard endpoints
//!
//! - GET /dashboard, /dashboard/{*section} - Gated HTML shell
//! - GET /api/dashboard/stats - Record counts
//! - GET /api/dashboard/navigation - Menu for the current session

use axum::{
    extract::{OriginalUri, State},
    response::Html,
    routing::get,
    Json, Router,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

use crate::dashboard::gate::DashboardSession;
use crate::dashboard::navigation::{navigation_for, NavItemResponse};
use crate::profile::repository::ProfileRepository;
use crate::role::repository::RoleRepository;
use crate::user::repository::UserRepository;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::site::render::{document, escape_html};
use crate::site::seo::{Metadata, Page};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users_count: u64,
    pub profiles_count: u64,
    pub public_profiles_count: u64,
    pub roles_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationResponse {
    pub items: Vec<NavItemResponse>,
}

#[derive(Clone)]
pub struct DashboardState {
    pub user_repo: Arc<UserRepository>,
    pub profile_repo: Arc<ProfileRepository>,
    pub role_repo: Arc<RoleRepository>,
    pub base_url: Arc<str>,
}

impl DashboardState {
    async fn stats(&self) -> Result<DashboardStats, PlatformError> {
        let (users_count, profiles_count, public_profiles_count, roles_count) = tokio::try_join!(
            self.user_repo.count(),
            self.profile_repo.count(),
            self.profile_repo.count_public(),
            self.role_repo.count(),
        )?;
        Ok(DashboardStats { users_count, profiles_count, public_profiles_count, roles_count })
    }
}

/// Dashboard statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "dashboard",
    operation_id = "getApiDashboardStats",
    responses(
        (status = 200, description = "Record counts", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<DashboardState>,
    _auth: Authenticated,
) -> Result<Json<DashboardStats>, PlatformError> {
    Ok(Json(state.stats().await?))
}

/// Navigation for the current session
#[utoipa::path(
    get,
    path = "/navigation",
    tag = "dashboard",
    operation_id = "getApiDashboardNavigation",
    responses(
        (status = 200, description = "Menu entries the session may use", body = NavigationResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_navigation(auth: Authenticated) -> Json<NavigationResponse> {
    let items = navigation_for(&auth).into_iter().map(Into::into).collect();
    Json(NavigationResponse { items })
}

fn render_shell(session: &DashboardSession, path: &str, stats: &DashboardStats) -> String {
    let items = navigation_for(session);
    let mut body = String::from("<aside>\n<strong>Kothler Admin</strong>\n<nav>\n<ul>\n");
    for item in &items {
        let current = if item.is_active(path) { " aria-current=\"page\"" } else { "" };
        let _ = writeln!(
            body,
            "<li><a href=\"{}\"{}>{}</a></li>",
            item.href,
            current,
            escape_html(item.title),
        );
    }
    body.push_str("</ul>\n</nav>\n<form method=\"post\" action=\"/api/auth/logout\"><button>Cerrar sesión</button></form>\n</aside>\n");

    let section = items.iter().find(|i| i.is_active(path)).map_or("Dashboard", |i| i.title);
    let _ = writeln!(body, "<section>\n<h1>{}</h1>", escape_html(section));
    let _ = writeln!(
        body,
        "<p>Bienvenido, {}. Gestiona los perfiles, usuarios y roles del sistema.</p>",
        escape_html(&session.name),
    );
    let _ = writeln!(
        body,
        "<dl>\n<dt>Perfiles</dt><dd>{} ({} públicos)</dd>\n<dt>Usuarios</dt><dd>{}</dd>\n<dt>Roles</dt><dd>{}</dd>\n</dl>",
        stats.profiles_count,
        stats.public_profiles_count,
        stats.users_count,
        stats.roles_count,
    );
    body.push_str("</section>\n");
    body
}

pub async fn dashboard_page(
    State(state): State<DashboardState>,
    OriginalUri(uri): OriginalUri,
    session: DashboardSession,
) -> Result<Html<String>, PlatformError> {
    let stats = state.stats().await?;
    let body = render_shell(&session, uri.path(), &stats);
    let meta = Metadata::for_page(Page::Dashboard, &state.base_url);
    Ok(Html(document(&meta, &[], &body)))
}

/// JSON endpoints, nested under `/api/dashboard`
pub fn dashboard_api_router(state: DashboardState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_stats))
        .routes(routes!(get_navigation))
        .with_state(state)
}

/// HTML shell for every `/dashboard` path
pub fn dashboard_pages_router(state: DashboardState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_page))
        .route("/dashboard/*section", get(dashboard_page))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions;

    fn session(perms: &[&str]) -> DashboardSession {
        DashboardSession(crate::AuthContext {
            user_id: "U1".into(),
            email: "ana@kothler.mx".into(),
            name: "Ana <Admin>".into(),
            role: "editor".into(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        })
    }

    fn stats() -> DashboardStats {
        DashboardStats { users_count: 3, profiles_count: 2, public_profiles_count: 1, roles_count: 2 }
    }

    #[test]
    fn test_shell_lists_only_permitted_sections() {
        let html = render_shell(&session(&[permissions::MANAGE_CONTENT]), "/dashboard", &stats());
        assert!(html.contains("/dashboard/services"));
        assert!(!html.contains("/dashboard/users"));
        assert!(html.contains("Ana &lt;Admin&gt;"));
    }

    #[test]
    fn test_shell_marks_current_section() {
        let html = render_shell(&session(&[permissions::MANAGE_PROFILES]), "/dashboard/profiles/new", &stats());
        assert!(html.contains("<a href=\"/dashboard/profiles\" aria-current=\"page\">"));
        assert!(html.contains("<h1>Perfiles</h1>"));
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(stats()).unwrap();
        assert_eq!(json["publicProfilesCount"], 1);
        assert_eq!(json["usersCount"], 3);
    }
}
