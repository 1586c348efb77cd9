//! Service Entity
//!
//! An offered service, addressable by its slug on the public site.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    /// Card summary
    pub description: String,

    /// Detail page body
    pub long_description: String,

    pub icon: String,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Unique, lowercase
    pub slug: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Canonical form of a slug
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

impl Service {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        long_description: impl Into<String>,
        icon: impl Into<String>,
        slug: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            title: title.into(),
            description: description.into(),
            long_description: long_description.into(),
            icon: icon.into(),
            features: Vec::new(),
            display_order: 0,
            is_active: true,
            slug: normalize_slug(slug),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_normalized() {
        let service = Service::new("Web", "Sitios web", "Sitios web a la medida", "globe", "  Desarrollo-Web ");
        assert_eq!(service.slug, "desarrollo-web");
    }

    #[test]
    fn test_with_features() {
        let service = Service::new("SEO", "Posicionamiento", "Posicionamiento orgánico", "search", "seo")
            .with_features(["Auditoría", "Contenido"]);
        assert_eq!(service.features, vec!["Auditoría", "Contenido"]);
    }
}
