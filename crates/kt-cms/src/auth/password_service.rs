//! Password Service
//!
//! Password hashing using Argon2id.

use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Algorithm, Params, Version,
};
use tracing::{debug, warn};

use crate::shared::error::{PlatformError, Result};

/// Password length policy
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    /// Validate a password against the policy. Lengths count characters.
    pub fn validate(&self, password: &str) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let len = password.chars().count();

        if len < self.min_length {
            errors.push(format!("Password must be at least {} characters", self.min_length));
        }

        if len > self.max_length {
            errors.push(format!("Password must be at most {} characters", self.max_length));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
    /// Output hash length in bytes
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low memory config for tests
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| PlatformError::internal(format!("Invalid Argon2 params: {}", e)))
    }
}

/// Password hashing service
pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(config: Argon2Config, policy: PasswordPolicy) -> Result<Self> {
        let params = config.to_params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2, policy })
    }

    /// Hash a password using Argon2id, after checking the policy
    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.validate_password(password)?;

        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Failed to hash password: {}", e)))?;

        debug!("Password hashed");
        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PlatformError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                warn!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(PlatformError::internal(format!("Password verification error: {}", e))),
        }
    }

    pub fn validate_password(&self, password: &str) -> Result<()> {
        self.policy
            .validate(password)
            .map_err(|errors| PlatformError::validation(errors.join("; ")))
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap()
    }

    #[test]
    fn test_policy_lengths() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("simplepassword").is_ok());
        assert!(policy.validate("short").is_err());
        assert!(policy.validate(&"x".repeat(129)).is_err());
        assert!(policy.validate(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let service = service();

        let hash = service.hash_password("testpassword123").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(service.verify_password("testpassword123", &hash).unwrap());
        assert!(!service.verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn test_hash_rejects_short_password() {
        let err = service().hash_password("short").unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[test]
    fn test_same_password_different_salts() {
        let service = service();
        let a = service.hash_password("testpassword123").unwrap();
        let b = service.hash_password("testpassword123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(service().verify_password("whatever1", "not-a-hash").is_err());
    }

    #[test]
    fn test_invalid_params() {
        let config = Argon2Config { memory_cost: 1, ..Argon2Config::testing() };
        assert!(PasswordService::new(config, PasswordPolicy::default()).is_err());
    }
}
