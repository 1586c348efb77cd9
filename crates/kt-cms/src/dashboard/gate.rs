//! Dashboard access gate
//!
//! Every `/dashboard` path needs an `admin` or `editor` session, and
//! `/dashboard/admin` paths need `admin`.

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::shared::authorization_service::AuthContext;
use crate::shared::middleware::OptionalAuth;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
const ADMIN_PATH: &str = "/dashboard/admin";

/// Roles allowed into the dashboard at all
pub const DASHBOARD_ROLES: [&str; 2] = ["admin", "editor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// 303 to the given location
    Redirect(String),
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

pub fn login_redirect(path: &str) -> String {
    format!("{}?callbackUrl={}", LOGIN_PATH, urlencoding::encode(path))
}

/// Decide whether a session may see a path
pub fn gate(path: &str, session: Option<&AuthContext>) -> GateDecision {
    if !under(path, DASHBOARD_PATH) {
        return GateDecision::Allow;
    }

    let Some(session) = session.filter(|s| DASHBOARD_ROLES.iter().any(|r| s.has_role(r))) else {
        return GateDecision::Redirect(login_redirect(path));
    };

    if under(path, ADMIN_PATH) && !session.is_admin() {
        return GateDecision::Redirect(DASHBOARD_PATH.to_string());
    }

    GateDecision::Allow
}

/// Session that passed the dashboard gate for the requested path
pub struct DashboardSession(pub AuthContext);

impl std::ops::Deref for DashboardSession {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Redirect issued by the gate
#[derive(Debug)]
pub struct GateRedirect(pub String);

impl IntoResponse for GateRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.0).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DashboardSession
where
    S: Send + Sync,
{
    type Rejection = GateRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let OptionalAuth(session) = match OptionalAuth::from_request_parts(parts, state).await {
            Ok(auth) => auth,
            Err(never) => match never {},
        };

        match (gate(&path, session.as_ref()), session) {
            (GateDecision::Allow, Some(session)) => Ok(DashboardSession(session)),
            (GateDecision::Allow, None) => Err(GateRedirect(login_redirect(&path))),
            (GateDecision::Redirect(location), _) => {
                tracing::debug!(path = %path, location = %location, "Dashboard gate redirect");
                Err(GateRedirect(location))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn session(role: &str) -> AuthContext {
        AuthContext {
            user_id: "U1".into(),
            email: "u@kothler.mx".into(),
            name: "U".into(),
            role: role.into(),
            permissions: HashSet::new(),
        }
    }

    #[test]
    fn test_no_session_goes_to_login() {
        assert_eq!(
            gate("/dashboard/users", None),
            GateDecision::Redirect("/auth/login?callbackUrl=%2Fdashboard%2Fusers".into())
        );
    }

    #[test]
    fn test_other_roles_go_to_login() {
        let viewer = session("viewer");
        assert!(matches!(gate("/dashboard", Some(&viewer)), GateDecision::Redirect(l) if l.starts_with(LOGIN_PATH)));
    }

    #[test]
    fn test_editor_allowed_but_not_admin_area() {
        let editor = session("editor");
        assert_eq!(gate("/dashboard", Some(&editor)), GateDecision::Allow);
        assert_eq!(gate("/dashboard/profiles/new", Some(&editor)), GateDecision::Allow);
        assert_eq!(
            gate("/dashboard/admin/settings", Some(&editor)),
            GateDecision::Redirect("/dashboard".into())
        );
    }

    #[test]
    fn test_admin_allowed_everywhere() {
        let admin = session("admin");
        assert_eq!(gate("/dashboard/admin", Some(&admin)), GateDecision::Allow);
        assert_eq!(gate("/dashboard/admin/settings", Some(&admin)), GateDecision::Allow);
    }

    #[test]
    fn test_non_dashboard_paths_pass() {
        assert_eq!(gate("/", None), GateDecision::Allow);
        assert_eq!(gate("/dashboards", None), GateDecision::Allow);
        assert_eq!(gate("/api/dashboard/stats", None), GateDecision::Allow);
    }

    #[test]
    fn test_administrators_path_is_not_admin_area() {
        let editor = session("editor");
        assert_eq!(gate("/dashboard/administrators", Some(&editor)), GateDecision::Allow);
    }
}
