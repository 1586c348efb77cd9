//! Profile Entity
//!
//! The public team-member card for a user. At most one profile per user.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

pub const DEFAULT_PROFILE_IMAGE: &str = "/placeholder.svg";

/// Social links, each optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl ProfileLinks {
    /// Overwrite only the links present in `other`
    pub fn merge(&mut self, other: ProfileLinks) {
        let ProfileLinks { linkedin, github, portfolio, twitter, instagram } = other;
        if linkedin.is_some() {
            self.linkedin = linkedin;
        }
        if github.is_some() {
            self.github = github;
        }
        if portfolio.is_some() {
            self.portfolio = portfolio;
        }
        if twitter.is_some() {
            self.twitter = twitter;
        }
        if instagram.is_some() {
            self.instagram = instagram;
        }
    }

    /// Non-empty links as (network, url) pairs
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        [
            ("linkedin", &self.linkedin),
            ("github", &self.github),
            ("portfolio", &self.portfolio),
            ("twitter", &self.twitter),
            ("instagram", &self.instagram),
        ]
        .into_iter()
        .filter_map(|(name, url)| {
            url.as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(|u| (name, u))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning user, unique
    pub user_id: String,

    pub position: String,

    pub bio: String,

    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default)]
    pub links: ProfileLinks,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[serde(default)]
    pub display_order: i32,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_image() -> String {
    DEFAULT_PROFILE_IMAGE.to_string()
}

fn default_true() -> bool {
    true
}

impl Profile {
    pub fn new(user_id: impl Into<String>, position: impl Into<String>, bio: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            user_id: user_id.into(),
            position: position.into(),
            bio: bio.into(),
            image: default_image(),
            links: ProfileLinks::default(),
            is_public: true,
            display_order: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let profile = Profile::new("U1", "Developer", "Builds things for the web");
        assert_eq!(profile.image, DEFAULT_PROFILE_IMAGE);
        assert!(profile.is_public);
        assert_eq!(profile.links, ProfileLinks::default());
    }

    #[test]
    fn test_links_merge_per_field() {
        let mut links = ProfileLinks {
            linkedin: Some("https://linkedin.com/in/ana".into()),
            github: Some("https://github.com/ana".into()),
            ..Default::default()
        };
        links.merge(ProfileLinks {
            github: Some("https://github.com/ana-dev".into()),
            twitter: Some("https://x.com/ana".into()),
            ..Default::default()
        });

        assert_eq!(links.linkedin.as_deref(), Some("https://linkedin.com/in/ana"));
        assert_eq!(links.github.as_deref(), Some("https://github.com/ana-dev"));
        assert_eq!(links.twitter.as_deref(), Some("https://x.com/ana"));
        assert_eq!(links.instagram, None);
    }

    #[test]
    fn test_present_skips_blank() {
        let links = ProfileLinks {
            github: Some("https://github.com/ana".into()),
            portfolio: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(links.present(), vec![("github", "https://github.com/ana")]);
    }

    #[test]
    fn test_empty_links_omitted_in_bson() {
        let profile = Profile::new("U1", "Developer", "Builds things for the web");
        let doc = bson::to_document(&profile).unwrap();
        assert!(doc.get_document("links").unwrap().is_empty());
    }
}
