//! Common API types and utilities

use axum::extract::FromRequest;
use utoipa::{ToSchema, IntoParams};
use serde::{Deserialize, Serialize};

use crate::shared::error::PlatformError;

/// JSON request body whose rejections render as `PlatformError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(PlatformError))]
pub struct ApiJson<T>(pub T);

mod string_or_number {
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination parameters (1-based page, `limit` items per page)
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    page: Option<u32>,
    #[serde(default, alias = "size", deserialize_with = "string_or_number::deserialize_u32_opt")]
    limit: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page: Some(page), limit: Some(limit) }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> u64 {
        (self.page() as u64 - 1) * (self.limit() as u64)
    }
}

/// Pagination block returned next to a page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total: u64) -> Self {
        let limit = params.limit();
        Self {
            total,
            page: params.page(),
            limit,
            pages: total.div_ceil(limit as u64),
        }
    }
}

/// Public list filter (`?active=true`)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveFilter {
    /// Only `true` restricts the list to active records
    pub active: Option<String>,
}

impl ActiveFilter {
    pub fn active_only(&self) -> bool {
        self.active.as_deref() == Some("true")
    }
}

/// Plain message response, e.g. after a delete
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
