//! Feature Entity
//!
//! A selling point shown on the home page.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub description: String,

    /// Icon name understood by the front end
    pub icon: String,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Feature {
    pub fn new(title: impl Into<String>, description: impl Into<String>, icon: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
            display_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}
