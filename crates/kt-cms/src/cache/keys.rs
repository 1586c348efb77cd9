//! Cache keys and TTL presets
//!
//! Lists live under `<plural>:all`, the filtered public list under
//! `<plural>:active` (`profiles:public`), items under `<singular>:<id>`.

/// Cached entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEntity {
    Profiles,
    Services,
    Projects,
    Packages,
    Features,
    Users,
    Roles,
}

impl CacheEntity {
    pub const ALL: [CacheEntity; 7] = [
        CacheEntity::Profiles,
        CacheEntity::Services,
        CacheEntity::Projects,
        CacheEntity::Packages,
        CacheEntity::Features,
        CacheEntity::Users,
        CacheEntity::Roles,
    ];

    pub fn plural(&self) -> &'static str {
        match self {
            CacheEntity::Profiles => "profiles",
            CacheEntity::Services => "services",
            CacheEntity::Projects => "projects",
            CacheEntity::Packages => "packages",
            CacheEntity::Features => "features",
            CacheEntity::Users => "users",
            CacheEntity::Roles => "roles",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            CacheEntity::Profiles => "profile",
            CacheEntity::Services => "service",
            CacheEntity::Projects => "project",
            CacheEntity::Packages => "package",
            CacheEntity::Features => "feature",
            CacheEntity::Users => "user",
            CacheEntity::Roles => "role",
        }
    }

    /// Key of the unfiltered list, e.g. `services:all`
    pub fn list_key(&self) -> String {
        format!("{}:all", self.plural())
    }

    /// Key of the public (active or public-only) list
    pub fn public_list_key(&self) -> String {
        match self {
            CacheEntity::Profiles => "profiles:public".to_string(),
            _ => format!("{}:active", self.plural()),
        }
    }

    /// Key of the list for a given filter
    pub fn list_key_for(&self, public_only: bool) -> String {
        if public_only {
            self.public_list_key()
        } else {
            self.list_key()
        }
    }

    pub fn item_key(&self, id: &str) -> String {
        format!("{}:{}", self.singular(), id)
    }

    /// Every list key of this entity
    pub fn list_keys(&self) -> Vec<String> {
        vec![self.list_key(), self.public_list_key()]
    }
}

/// TTL presets in seconds
pub mod ttl {
    /// 5 minutes
    pub const SHORT: u64 = 300;
    /// 30 minutes
    pub const MEDIUM: u64 = 1800;
    /// 1 hour
    pub const LONG: u64 = 3600;
    /// 24 hours
    pub const VERY_LONG: u64 = 86400;
}
