//! Project Entity
//!
//! A portfolio entry.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub description: String,

    /// Image URLs, first one is the cover
    #[serde(default)]
    pub images: Vec<String>,

    pub category: String,

    pub client: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub completion_date: DateTime<Utc>,

    #[serde(default)]
    pub technologies: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

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

impl Project {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        client: impl Into<String>,
        completion_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            title: title.into(),
            description: description.into(),
            images: Vec::new(),
            category: category.into(),
            client: client.into(),
            completion_date,
            technologies: Vec::new(),
            link: None,
            display_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_omitted_when_absent() {
        let project = Project::new("Site", "A marketing site", "web", "ACME", Utc::now());
        let doc = bson::to_document(&project).unwrap();
        assert!(!doc.contains_key("link"));
        assert!(doc.get_datetime("completionDate").is_ok());
    }
}
