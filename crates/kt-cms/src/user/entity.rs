//! User Entity
//!
//! An authentication-capable account. The password hash is stored but never
//! leaves the service: API views are built from [`UserResponse`](crate::user::api::UserResponse).

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique, stored lowercased
    pub email: String,

    /// Argon2id PHC hash
    pub password: String,

    pub name: String,

    /// Role ID
    pub role: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn new(
        email: impl AsRef<str>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            email: normalize_email(email.as_ref()),
            password: password_hash.into(),
            name: name.into(),
            role: role_id.into(),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
