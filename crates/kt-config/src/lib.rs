//! Kothler Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// 30 days
pub const DEFAULT_SESSION_EXPIRY_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub mongodb: MongoConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub site: SiteConfig,

    /// Enable development mode (seeding, relaxed secret checks)
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            mongodb: MongoConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            site: SiteConfig::default(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "kothler".to_string(),
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

impl std::str::FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            "disabled" | "none" | "off" => Ok(CacheBackend::Disabled),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown cache backend: {}",
                other
            ))),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// TTL applied when a caller does not pick a preset
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl_secs: 1800,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub session: SessionConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret (HS256). Ignored when both key paths are set.
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub private_key_path: String,
    pub public_key_path: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "kothler".to_string(),
            audience: "kothler".to_string(),
            private_key_path: String::new(),
            public_key_path: String::new(),
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    pub same_site: String,
    pub expiry_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "kt_session".to_string(),
            secure: false,
            same_site: "Lax".to_string(),
            expiry_secs: DEFAULT_SESSION_EXPIRY_SECS,
        }
    }
}

/// Public site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute base URL used in canonical links, sitemap and JSON-LD
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kothler.com".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check settings that cannot be defaulted safely
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.auth.jwt;
        let has_rsa = match (jwt.private_key_path.is_empty(), jwt.public_key_path.is_empty()) {
            (true, true) => false,
            (false, false) => true,
            _ => {
                return Err(ConfigError::ValidationError(
                    "auth.jwt.private_key_path and public_key_path must be set together".to_string(),
                ))
            }
        };

        if has_rsa {
            for path in [&jwt.private_key_path, &jwt.public_key_path] {
                if !Path::new(path).is_file() {
                    return Err(ConfigError::ValidationError(format!(
                        "JWT key file not found: {}",
                        path
                    )));
                }
            }
        }

        if !self.dev_mode && !has_rsa && jwt.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.secret must be set outside dev mode".to_string(),
            ));
        }

        if self.auth.session.expiry_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session.expiry_secs must be positive".to_string(),
            ));
        }

        if self.http.port == 0 {
            return Err(ConfigError::ValidationError("http.port must not be 0".to_string()));
        }

        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Kothler Configuration
# Environment variables (KOTHLER_*) override these settings

dev_mode = false

[http]
port = 3000
host = "0.0.0.0"
cors_origins = ["http://localhost:3000"]

[mongodb]
uri = "mongodb://localhost:27017"
database = "kothler"

[cache]
backend = "redis"  # redis, memory, disabled
redis_url = "redis://localhost:6379"
default_ttl_secs = 1800

[auth.jwt]
secret = "change-me"
issuer = "kothler"
audience = "kothler"
private_key_path = ""
public_key_path = ""

[auth.session]
cookie_name = "kt_session"
secure = true
same_site = "Lax"
expiry_secs = 2592000

[site]
base_url = "https://kothler.com"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.auth.session.expiry_secs, 2_592_000);
        assert_eq!(config.auth.session.cookie_name, "kt_session");
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.auth.jwt.secret, "change-me");
        assert!(config.auth.session.secure);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 8081\n\n[cache]\nbackend = \"disabled\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.http.port, 8081);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.cache.backend, CacheBackend::Disabled);
        assert_eq!(config.mongodb.database, "kothler");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validate_requires_secret_outside_dev_mode() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.dev_mode = true;
        assert!(config.validate().is_ok());

        config.dev_mode = false;
        config.auth.jwt.secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_key_files() {
        let mut config = AppConfig::default();
        config.auth.jwt.private_key_path = "/nonexistent/jwt-private.pem".to_string();
        config.auth.jwt.public_key_path = "/nonexistent/jwt-public.pem".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let private_key = tempfile::NamedTempFile::new().unwrap();
        let public_key = tempfile::NamedTempFile::new().unwrap();
        config.auth.jwt.private_key_path = private_key.path().display().to_string();
        config.auth.jwt.public_key_path = public_key.path().display().to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_single_key_path() {
        let mut config = AppConfig::default();
        config.auth.jwt.secret = "s3cret".to_string();
        config.auth.jwt.private_key_path = "/etc/kothler/jwt-private.pem".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_backend_from_str() {
        assert_eq!("Redis".parse::<CacheBackend>().unwrap(), CacheBackend::Redis);
        assert_eq!("off".parse::<CacheBackend>().unwrap(), CacheBackend::Disabled);
        assert!("memcached".parse::<CacheBackend>().is_err());
    }
}
