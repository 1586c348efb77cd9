//! Role and Permission Entities
//!
//! A role is a named bundle of permission strings. Users reference one role.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Role definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique role name (e.g. "admin", "editor")
    pub name: String,

    pub description: String,

    /// Permissions granted by this role, in insertion order
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub is_default: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            name: name.into(),
            description: description.into(),
            permissions: Vec::new(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for p in permissions {
            self.grant_permission(p);
        }
        self
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn grant_permission(&mut self, permission: impl Into<String>) {
        let permission = permission.into();
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    /// Replace the permission set, dropping duplicates
    pub fn set_permissions(&mut self, permissions: Vec<String>) {
        self.permissions.clear();
        for p in permissions {
            self.grant_permission(p);
        }
        self.updated_at = Utc::now();
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Known permission tokens
pub mod permissions {
    /// Writes to services, projects, packages and features
    pub const MANAGE_CONTENT: &str = "manage_content";
    pub const MANAGE_USERS: &str = "manage_users";
    pub const MANAGE_ROLES: &str = "manage_roles";
    pub const MANAGE_PROFILES: &str = "manage_profiles";

    pub const ALL: &[&str] = &[MANAGE_CONTENT, MANAGE_USERS, MANAGE_ROLES, MANAGE_PROFILES];

    pub fn description(permission: &str) -> Option<&'static str> {
        match permission {
            MANAGE_CONTENT => Some("Create, edit and delete services, projects, packages and features"),
            MANAGE_USERS => Some("Manage user accounts"),
            MANAGE_ROLES => Some("View and manage roles and their permissions"),
            MANAGE_PROFILES => Some("Manage team profiles"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_deduplicated() {
        let mut role = Role::new("editor", "Content editor")
            .with_permissions(["manage_content", "manage_content", "manage_profiles"]);
        assert_eq!(role.permissions, vec!["manage_content", "manage_profiles"]);

        role.set_permissions(vec!["manage_users".into(), "manage_users".into()]);
        assert_eq!(role.permissions, vec!["manage_users"]);
        assert!(role.has_permission("manage_users"));
        assert!(!role.has_permission("manage_content"));
    }

    #[test]
    fn test_known_permissions_have_descriptions() {
        for p in permissions::ALL {
            assert!(permissions::description(p).is_some());
        }
        assert!(permissions::description("publish").is_none());
    }

    #[test]
    fn test_bson_uses_underscore_id() {
        let role = Role::new("admin", "Administrator");
        let doc = bson::to_document(&role).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("isDefault"));
        assert!(doc.contains_key("createdAt"));
    }
}
