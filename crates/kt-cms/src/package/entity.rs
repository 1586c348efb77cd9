//! Package Entity
//!
//! A priced plan on the home page.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use utoipa::ToSchema;

pub const DEFAULT_CURRENCY: &str = "mxn";
pub const DEFAULT_INTERVAL: &str = "mes";

/// A group of bullet points inside a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageFeature {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(rename = "_id")]
    pub id: String,

    /// Short internal name
    pub name: String,

    pub title: String,

    pub description: String,

    pub price: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Billing interval label
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default)]
    pub features: Vec<PackageFeature>,

    #[serde(default)]
    pub is_popular: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub display_order: i32,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

fn default_true() -> bool {
    true
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        price: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            name: name.into(),
            title: title.into(),
            description: description.into(),
            price,
            currency: default_currency(),
            interval: default_interval(),
            features: Vec::new(),
            is_popular: false,
            is_active: true,
            display_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display order for a package appended after `last`, `None` once the
    /// order space is exhausted
    pub fn next_display_order(last: Option<i32>) -> Option<i32> {
        match last {
            Some(order) => order.checked_add(1),
            None => Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let package = Package::new("basic", "Básico", "Landing page", 4999.0);
        assert_eq!(package.currency, "mxn");
        assert_eq!(package.interval, "mes");
        assert!(!package.is_popular);
        assert!(package.is_active);
    }

    #[test]
    fn test_next_display_order() {
        assert_eq!(Package::next_display_order(None), Some(0));
        assert_eq!(Package::next_display_order(Some(0)), Some(1));
        assert_eq!(Package::next_display_order(Some(7)), Some(8));
        assert_eq!(Package::next_display_order(Some(-5)), Some(-4));
    }

    #[test]
    fn test_next_display_order_at_upper_bound() {
        assert_eq!(Package::next_display_order(Some(i32::MAX - 1)), Some(i32::MAX));
        assert_eq!(Package::next_display_order(Some(i32::MAX)), None);
    }

    #[test]
    fn test_missing_currency_defaults_on_read() {
        let doc = bson::doc! {
            "_id": "0ABCDEFGHJKMN",
            "name": "pro",
            "title": "Pro",
            "description": "Everything",
            "price": 9999.0,
            "createdAt": bson::DateTime::now(),
            "updatedAt": bson::DateTime::now(),
        };
        let package: Package = bson::from_document(doc).unwrap();
        assert_eq!(package.currency, DEFAULT_CURRENCY);
        assert!(package.features.is_empty());
    }
}
