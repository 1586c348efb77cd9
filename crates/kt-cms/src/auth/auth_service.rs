//! Authentication Service
//!
//! Session token generation and validation.
//! Supports both RS256 (RSA) when PEM keys are configured and HS256 (HMAC) otherwise.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

use crate::shared::error::{PlatformError, Result};
use crate::{Role, User};

/// JWT claims carried by a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    pub iss: String,

    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID
    pub jti: String,

    pub email: String,

    pub name: String,

    /// Role name at login
    pub role: String,

    /// Role permissions at login
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Configuration for the auth service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// RSA private key PEM content (for RS256)
    /// Takes precedence over secret_key if set
    pub rsa_private_key: Option<String>,

    /// RSA public key PEM content (for RS256)
    pub rsa_public_key: Option<String>,

    /// HMAC secret for HS256
    pub secret_key: String,

    pub issuer: String,

    pub audience: String,

    /// Session lifetime in seconds
    pub session_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            rsa_private_key: None,
            rsa_public_key: None,
            secret_key: String::new(),
            issuer: "kothler".to_string(),
            audience: "kothler".to_string(),
            session_expiry_secs: kt_config::DEFAULT_SESSION_EXPIRY_SECS,
        }
    }
}

impl AuthConfig {
    /// Build from application settings, reading any configured PEM files.
    /// A configured key path that cannot be read is an error.
    pub fn from_app_config(config: &kt_config::AuthConfig) -> Result<Self> {
        let (rsa_private_key, rsa_public_key) = Self::load_rsa_keys(
            Some(config.jwt.private_key_path.as_str()),
            Some(config.jwt.public_key_path.as_str()),
        )?;

        Ok(Self {
            rsa_private_key,
            rsa_public_key,
            secret_key: config.jwt.secret.clone(),
            issuer: config.jwt.issuer.clone(),
            audience: config.jwt.audience.clone(),
            session_expiry_secs: config.session.expiry_secs,
        })
    }

    /// Load RSA keys from file paths; an empty or absent path yields `None`
    pub fn load_rsa_keys(
        private_key_path: Option<&str>,
        public_key_path: Option<&str>,
    ) -> Result<(Option<String>, Option<String>)> {
        let private_key = private_key_path.map(Self::load_key).transpose()?.flatten();
        let public_key = public_key_path.map(Self::load_key).transpose()?.flatten();

        if private_key.is_some() != public_key.is_some() {
            return Err(PlatformError::internal(
                "Both JWT private and public key paths must be set for RS256",
            ));
        }

        Ok((private_key, public_key))
    }

    fn load_key(path: &str) -> Result<Option<String>> {
        if path.is_empty() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| {
            PlatformError::internal(format!("Could not read JWT key file {}: {}", path, e))
        })?;
        info!(path, "Loaded JWT key from file");
        Ok(Some(content))
    }
}

/// Authentication service for session tokens
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl AuthService {
    /// Create auth service with RSA keys (RS256)
    pub fn new_with_rsa(config: AuthConfig, private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| PlatformError::internal(format!("Invalid RSA private key: {}", e)))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| PlatformError::internal(format!("Invalid RSA public key: {}", e)))?;

        info!("AuthService initialized with RS256");

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
        })
    }

    /// Create auth service with HMAC secret (HS256)
    pub fn new_with_secret(config: AuthConfig) -> Result<Self> {
        if config.secret_key.is_empty() {
            return Err(PlatformError::internal("JWT secret must not be empty"));
        }

        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        info!("AuthService initialized with HS256");

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            algorithm: Algorithm::HS256,
        })
    }

    /// RS256 when RSA keys are present, HS256 with the secret otherwise.
    /// Invalid RSA keys are an error rather than a silent downgrade.
    pub fn new(config: AuthConfig) -> Result<Self> {
        match (config.rsa_private_key.clone(), config.rsa_public_key.clone()) {
            (Some(private_key), Some(public_key)) => {
                Self::new_with_rsa(config, &private_key, &public_key)
            }
            (None, None) => Self::new_with_secret(config),
            _ => Err(PlatformError::internal(
                "Both RSA private and public keys are required for RS256",
            )),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn session_expiry_secs(&self) -> i64 {
        self.config.session_expiry_secs
    }

    /// Issue a session for a user, snapshotting the role's permissions
    pub fn generate_session_token(&self, user: &User, role: &Role) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.session_expiry_secs);

        let claims = SessionClaims {
            sub: user.id.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: crate::TsidGenerator::generate(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: role.name.clone(),
            permissions: role.permissions.clone(),
        };

        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode JWT: {}", e)))
    }

    /// Validate a session token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: e.to_string() },
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn fixtures() -> (User, Role) {
        let role = Role::new("editor", "Content editor")
            .with_permissions(["manage_content", "manage_profiles"]);
        let user = User::new("editor@kothler.com", "$argon2id$stub", "Editor", &role.id);
        (user, role)
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = service();
        let (user, role) = fixtures();

        let token = service.generate_session_token(&user, &role).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "editor");
        assert_eq!(claims.permissions, vec!["manage_content", "manage_profiles"]);
        assert_eq!(claims.exp - claims.iat, kt_config::DEFAULT_SESSION_EXPIRY_SECS);
    }

    #[test]
    fn test_rejects_token_from_other_secret() {
        let (user, role) = fixtures();
        let token = service().generate_session_token(&user, &role).unwrap();

        let other = AuthService::new(AuthConfig {
            secret_key: "another-secret".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(other.validate_token(&token), Err(PlatformError::InvalidToken { .. })));
    }

    #[test]
    fn test_rejects_wrong_audience() {
        let (user, role) = fixtures();
        let token = service().generate_session_token(&user, &role).unwrap();

        let other = AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            audience: "someone-else".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = AuthService::new(AuthConfig {
            secret_key: "test-secret".to_string(),
            session_expiry_secs: -3600,
            ..Default::default()
        })
        .unwrap();
        let (user, role) = fixtures();
        let token = service.generate_session_token(&user, &role).unwrap();

        assert!(matches!(service.validate_token(&token), Err(PlatformError::TokenExpired)));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let result = AuthService::new(AuthConfig::default());
        assert!(matches!(result, Err(PlatformError::Internal { .. })));
    }

    #[test]
    fn test_unreadable_key_files_do_not_fall_back_to_hmac() {
        let mut app_auth = kt_config::AuthConfig::default();
        app_auth.jwt.private_key_path = "/nonexistent/jwt-private.pem".to_string();
        app_auth.jwt.public_key_path = "/nonexistent/jwt-public.pem".to_string();

        assert!(AuthConfig::from_app_config(&app_auth).is_err());
    }

    #[test]
    fn test_invalid_rsa_keys_are_rejected() {
        let config = AuthConfig {
            rsa_private_key: Some("not a pem".to_string()),
            rsa_public_key: Some("not a pem".to_string()),
            ..Default::default()
        };
        assert!(AuthService::new(config).is_err());

        let half = AuthConfig {
            rsa_private_key: Some("not a pem".to_string()),
            secret_key: "test-secret".to_string(),
            ..Default::default()
        };
        assert!(AuthService::new(half).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
