//! CMS Error Types

use thiserror::Error;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} with {field} '{value}' already exists")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// A request that conflicts with referencing records, e.g. deleting a role still in use
    #[error("{message}")]
    InUse { message: String, count: u64 },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn in_use(message: impl Into<String>, count: u64) -> Self {
        Self::InUse { message: message.into(), count }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// HTTP status and machine-readable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            PlatformError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlatformError::Duplicate { .. } => (StatusCode::BAD_REQUEST, "DUPLICATE"),
            PlatformError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PlatformError::InUse { .. } => (StatusCode::BAD_REQUEST, "IN_USE"),
            PlatformError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlatformError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PlatformError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            PlatformError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            PlatformError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Malformed, mistyped or non-JSON bodies are validation failures
impl From<JsonRejection> for PlatformError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        let count = match &self {
            PlatformError::InUse { count, .. } => Some(*count),
            _ => None,
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            count,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PlatformError::not_found("Role", "x").status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(PlatformError::duplicate("Service", "slug", "web").status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(PlatformError::unauthorized("no session").status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(PlatformError::forbidden("nope").status_and_code().0, StatusCode::FORBIDDEN);
        assert_eq!(PlatformError::TokenExpired.status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(PlatformError::internal("boom").status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_in_use_carries_count() {
        let response = PlatformError::in_use("Cannot delete role with associated users", 3).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let rejection = Json::<serde_json::Value>::from_bytes(b"{\"name\": ").unwrap_err();
        let err = PlatformError::from(rejection);
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
    }

    #[test]
    fn test_duplicate_message() {
        let err = PlatformError::duplicate("User", "email", "a@b.c");
        assert_eq!(err.to_string(), "User with email 'a@b.c' already exists");
    }
}
