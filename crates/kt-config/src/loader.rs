//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "kothler.toml",
    "./config/config.toml",
    "./config/kothler.toml",
    "/etc/kothler/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) but with a custom variable source.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, searching defaults");
        }

        if let Some(path) = lookup("KOTHLER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("KOTHLER_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("KOTHLER_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("KOTHLER_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // MongoDB
    if let Some(val) = lookup("KOTHLER_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("KOTHLER_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Cache
    if let Some(val) = lookup("KOTHLER_CACHE_BACKEND") {
        config.cache.backend = val.parse()?;
    }
    if let Some(val) = lookup("KOTHLER_REDIS_URL") {
        config.cache.redis_url = val;
    }
    if let Some(ttl) = lookup("KOTHLER_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.cache.default_ttl_secs = ttl;
    }

    // Auth
    if let Some(val) = lookup("KOTHLER_JWT_SECRET") {
        config.auth.jwt.secret = val;
    }
    if let Some(val) = lookup("KOTHLER_JWT_ISSUER") {
        config.auth.jwt.issuer = val;
    }
    if let Some(val) = lookup("KOTHLER_JWT_AUDIENCE") {
        config.auth.jwt.audience = val;
    }
    if let Some(val) = lookup("KOTHLER_JWT_PRIVATE_KEY_PATH") {
        config.auth.jwt.private_key_path = val;
    }
    if let Some(val) = lookup("KOTHLER_JWT_PUBLIC_KEY_PATH") {
        config.auth.jwt.public_key_path = val;
    }
    if let Some(val) = lookup("KOTHLER_SESSION_COOKIE_NAME") {
        config.auth.session.cookie_name = val;
    }
    if let Some(val) = lookup("KOTHLER_SESSION_COOKIE_SECURE") {
        config.auth.session.secure = val.parse().unwrap_or(false);
    }
    if let Some(secs) = lookup("KOTHLER_SESSION_EXPIRY_SECS").and_then(|v| v.parse().ok()) {
        config.auth.session.expiry_secs = secs;
    }

    // Site
    if let Some(val) = lookup("KOTHLER_SITE_BASE_URL") {
        config.site.base_url = val.trim_end_matches('/').to_string();
    }

    // General
    if let Some(val) = lookup("KOTHLER_DEV_MODE") {
        config.dev_mode = val == "true" || val == "1";
    }

    Ok(())
}
