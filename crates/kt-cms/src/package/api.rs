//! Packages API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheEntity, CacheItem, CacheService};
use crate::package::entity::{Package, PackageFeature};
use crate::package::repository::PackageRepository;
use crate::shared::api_common::{ApiJson, ActiveFilter, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::Validator;

fn valid_price(price: Option<f64>) -> bool {
    price.is_some_and(|p| p.is_finite() && p != 0.0)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub interval: Option<String>,
    #[serde(default)]
    pub features: Vec<PackageFeature>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

impl CreatePackageRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .required("name", self.name.trim())
            .required("title", self.title.trim())
            .required("description", self.description.trim())
            .check(valid_price(self.price), "price is required and must be non-zero")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub interval: Option<String>,
    pub features: Option<Vec<PackageFeature>>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

impl UpdatePackageRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        let mut v = Validator::new();
        for (field, value) in [("name", &self.name), ("title", &self.title), ("description", &self.description)] {
            if let Some(value) = value {
                v.required(field, value.trim());
            }
        }
        if self.price.is_some() {
            v.check(valid_price(self.price), "price must be non-zero");
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub interval: String,
    pub features: Vec<PackageFeature>,
    pub is_popular: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Package> for PackageResponse {
    fn from(p: Package) -> Self {
        Self {
            id: p.id,
            name: p.name,
            title: p.title,
            description: p.description,
            price: p.price,
            currency: p.currency,
            interval: p.interval,
            features: p.features,
            is_popular: p.is_popular,
            is_active: p.is_active,
            display_order: p.display_order,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

impl CacheItem for PackageResponse {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageEnvelope {
    pub package: PackageResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageListResponse {
    pub packages: Vec<PackageResponse>,
}

#[derive(Clone)]
pub struct PackagesState {
    pub package_repo: Arc<PackageRepository>,
    pub cache: CacheService,
}

impl PackagesState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Packages, id).await;
    }

    /// Read-through list
    pub async fn list(&self, active_only: bool) -> Result<Vec<PackageResponse>, PlatformError> {
        let key = CacheEntity::Packages.list_key_for(active_only);
        if let Some(cached) = self.cache.get::<Vec<PackageResponse>>(&key).await {
            return Ok(cached);
        }

        let packages: Vec<PackageResponse> = self.package_repo.find_all(active_only).await?
            .into_iter()
            .map(Into::into)
            .collect();
        self.cache.cache_list(CacheEntity::Packages, &key, &packages, None).await;
        Ok(packages)
    }

    async fn get(&self, id: &str) -> Result<PackageResponse, PlatformError> {
        let key = CacheEntity::Packages.item_key(id);
        if let Some(cached) = self.cache.get::<PackageResponse>(&key).await {
            return Ok(cached);
        }

        let package: PackageResponse = self.package_repo.find_by_id(id).await?
            .ok_or_else(|| PlatformError::not_found("Package", id))?
            .into();
        self.cache.set(&key, &package, None).await;
        Ok(package)
    }
}

/// List packages
#[utoipa::path(
    get,
    path = "",
    tag = "packages",
    operation_id = "getApiPackages",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Packages by display order", body = PackageListResponse)
    )
)]
pub async fn list_packages(
    State(state): State<PackagesState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<PackageListResponse>, PlatformError> {
    let packages = state.list(filter.active_only()).await?;
    Ok(Json(PackageListResponse { packages }))
}

/// Create package
///
/// New packages are appended after the current last display order.
#[utoipa::path(
    post,
    path = "",
    tag = "packages",
    operation_id = "postApiPackages",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageEnvelope),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_content")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_package(
    State(state): State<PackagesState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreatePackageRequest>,
) -> Result<(StatusCode, Json<PackageEnvelope>), PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let last = state.package_repo.max_display_order().await?;
    let display_order = Package::next_display_order(last).ok_or_else(|| {
        PlatformError::validation("displayOrder of the last package is at its maximum")
    })?;

    let mut package = Package::new(
        req.name.trim(),
        req.title.trim(),
        req.description,
        req.price.unwrap_or_default(),
    );
    if let Some(currency) = req.currency.filter(|c| !c.trim().is_empty()) {
        package.currency = currency.trim().to_lowercase();
    }
    if let Some(interval) = req.interval.filter(|i| !i.trim().is_empty()) {
        package.interval = interval.trim().to_string();
    }
    package.features = req.features;
    package.is_popular = req.is_popular.unwrap_or(false);
    package.is_active = req.is_active.unwrap_or(true);
    package.display_order = display_order;

    state.package_repo.insert(&package).await?;
    state.invalidate(None).await;

    info!(package_id = %package.id, display_order = package.display_order, by = %auth.user_id, "Package created");
    Ok((StatusCode::CREATED, Json(PackageEnvelope { package: package.into() })))
}

/// Get package by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "packages",
    operation_id = "getApiPackagesById",
    params(("id" = String, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package found", body = PackageEnvelope),
        (status = 404, description = "Package not found")
    )
)]
pub async fn get_package(
    State(state): State<PackagesState>,
    Path(id): Path<String>,
) -> Result<Json<PackageEnvelope>, PlatformError> {
    let package = state.get(&id).await?;
    Ok(Json(PackageEnvelope { package }))
}

/// Update package
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "packages",
    operation_id = "putApiPackagesById",
    params(("id" = String, Path, description = "Package ID")),
    request_body = UpdatePackageRequest,
    responses(
        (status = 200, description = "Package updated", body = PackageEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Package not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_package(
    State(state): State<PackagesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdatePackageRequest>,
) -> Result<Json<PackageEnvelope>, PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let mut package = state.package_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Package", &id))?;

    if let Some(name) = req.name {
        package.name = name.trim().to_string();
    }
    if let Some(title) = req.title {
        package.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        package.description = description;
    }
    if let Some(price) = req.price {
        package.price = price;
    }
    if let Some(currency) = req.currency.filter(|c| !c.trim().is_empty()) {
        package.currency = currency.trim().to_lowercase();
    }
    if let Some(interval) = req.interval.filter(|i| !i.trim().is_empty()) {
        package.interval = interval.trim().to_string();
    }
    if let Some(features) = req.features {
        package.features = features;
    }
    if let Some(popular) = req.is_popular {
        package.is_popular = popular;
    }
    if let Some(active) = req.is_active {
        package.is_active = active;
    }
    if let Some(order) = req.display_order {
        package.display_order = order;
    }

    package.updated_at = chrono::Utc::now();
    state.package_repo.update(&package).await?;
    state.invalidate(Some(&package.id)).await;

    info!(package_id = %package.id, by = %auth.user_id, "Package updated");
    Ok(Json(PackageEnvelope { package: package.into() }))
}

/// Delete package
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "packages",
    operation_id = "deleteApiPackagesById",
    params(("id" = String, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package deleted", body = MessageResponse),
        (status = 404, description = "Package not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_package(
    State(state): State<PackagesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_content(&auth)?;

    if !state.package_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Package", &id));
    }
    state.invalidate(Some(&id)).await;

    info!(package_id = %id, by = %auth.user_id, "Package deleted");
    Ok(Json(MessageResponse::new("Package deleted successfully")))
}

pub fn packages_router(state: PackagesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_packages, create_package))
        .routes(routes!(get_package, update_package, delete_package))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_required_and_non_zero() {
        assert!(!valid_price(None));
        assert!(!valid_price(Some(0.0)));
        assert!(!valid_price(Some(f64::NAN)));
        assert!(valid_price(Some(1499.5)));
    }

    #[test]
    fn test_create_requires_name_title_description() {
        let req: CreatePackageRequest = serde_json::from_str(r#"{"price": 100}"#).unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("name"));
        assert!(msg.contains("title"));
        assert!(msg.contains("description"));
        assert!(!msg.contains("price"));
    }

    #[test]
    fn test_create_parses_feature_groups() {
        let req: CreatePackageRequest = serde_json::from_value(serde_json::json!({
            "name": "pro",
            "title": "Profesional",
            "description": "Sitio completo",
            "price": 12999,
            "features": [{"category": "Diseño", "items": ["5 páginas", "Blog"]}],
            "isPopular": true
        })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.features[0].items.len(), 2);
        assert_eq!(req.is_popular, Some(true));
    }

    #[test]
    fn test_update_rejects_zero_price() {
        let req = UpdatePackageRequest { price: Some(0.0), ..Default::default() };
        assert!(req.validate().is_err());
        assert!(UpdatePackageRequest::default().validate().is_ok());
    }
}
