//! Request validation helpers
//!
//! Collects every failing field before reporting, so a client sees all
//! problems with a payload at once.

use std::sync::OnceLock;
use regex::Regex;

use crate::shared::error::{PlatformError, Result};

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// Accumulates field errors
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum length in characters (not bytes)
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.chars().count() < min {
            self.errors.push(format!("{} must be at least {} characters", field, min));
        }
        self
    }

    /// Same as [`min_len`](Self::min_len) but skipped when the value is absent
    pub fn min_len_opt(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(v) = value {
            self.min_len(field, v, min);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(format!("{} is required", field));
        }
        self
    }

    pub fn min_items<T>(&mut self, field: &str, items: &[T], min: usize) -> &mut Self {
        if items.len() < min {
            self.errors.push(format!("{} must contain at least {} item(s)", field, min));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.errors.push(format!("{} must be a valid email address", field));
        }
        self
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(message.into());
        }
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(PlatformError::validation(std::mem::take(&mut self.errors).join("; ")))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(value.trim()))
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = value.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
