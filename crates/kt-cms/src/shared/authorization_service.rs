//! Authorization
//!
//! Permission gate for the CMS. A session's permissions are the snapshot of
//! its role taken at login; matching is exact string equality.

use std::collections::HashSet;
use crate::permissions;
use crate::shared::error::{PlatformError, Result};
use crate::SessionClaims;

/// Authorization context for a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID
    pub user_id: String,

    pub email: String,

    /// Display name
    pub name: String,

    /// Role name (e.g. `admin`, `editor`)
    pub role: String,

    /// Permissions copied from the role when the session was issued
    pub permissions: HashSet<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            role: claims.role.clone(),
            permissions: claims.permissions.iter().cloned().collect(),
        }
    }

    /// Exact-match permission check. No wildcards, no inheritance.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}

/// The permission gate: no session is a 401, a session without the
/// permission is a 403.
pub fn authorize(context: Option<&AuthContext>, permission: &str) -> Result<()> {
    let Some(context) = context else {
        return Err(PlatformError::unauthorized("Authentication required"));
    };
    checks::require_permission(context, permission)
}

/// Common authorization checks
pub mod checks {
    use super::*;

    pub fn require_permission(context: &AuthContext, permission: &str) -> Result<()> {
        if context.has_permission(permission) {
            Ok(())
        } else {
            Err(PlatformError::forbidden(format!(
                "Permission required: {}",
                permission
            )))
        }
    }

    /// Writes to services, projects, packages and features
    pub fn can_manage_content(context: &AuthContext) -> Result<()> {
        require_permission(context, permissions::MANAGE_CONTENT)
    }

    pub fn can_manage_users(context: &AuthContext) -> Result<()> {
        require_permission(context, permissions::MANAGE_USERS)
    }

    /// Every role endpoint, reads included
    pub fn can_manage_roles(context: &AuthContext) -> Result<()> {
        require_permission(context, permissions::MANAGE_ROLES)
    }

    pub fn can_manage_profiles(context: &AuthContext) -> Result<()> {
        require_permission(context, permissions::MANAGE_PROFILES)
    }
}
