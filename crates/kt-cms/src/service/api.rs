//! Services API
//!
//! Reads are public; `GET /by-slug/{slug}` backs the public detail pages.
//! Writes need `manage_content`.

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
use crate::service::entity::{normalize_slug, Service};
use crate::service::repository::ServiceRepository;
use crate::shared::api_common::{ApiJson, ActiveFilter, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::Validator;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub slug: String,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateServiceRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len("title", self.title.trim(), 2)
            .min_len("description", &self.description, 10)
            .min_len("longDescription", &self.long_description, 20)
            .min_len("icon", self.icon.trim(), 1)
            .min_items("features", &self.features, 1)
            .min_len("slug", self.slug.trim(), 2)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub icon: Option<String>,
    pub features: Option<Vec<String>>,
    pub slug: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateServiceRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        let mut v = Validator::new();
        v.min_len_opt("title", self.title.as_deref().map(str::trim), 2)
            .min_len_opt("description", self.description.as_deref(), 10)
            .min_len_opt("longDescription", self.long_description.as_deref(), 20)
            .min_len_opt("icon", self.icon.as_deref().map(str::trim), 1)
            .min_len_opt("slug", self.slug.as_deref().map(str::trim), 2);
        if let Some(features) = &self.features {
            v.min_items("features", features, 1);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub icon: String,
    pub features: Vec<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            long_description: s.long_description,
            icon: s.icon,
            features: s.features,
            display_order: s.display_order,
            is_active: s.is_active,
            slug: s.slug,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

impl CacheItem for ServiceResponse {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceEnvelope {
    pub service: ServiceResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceListResponse {
    pub services: Vec<ServiceResponse>,
}

#[derive(Clone)]
pub struct ServicesState {
    pub service_repo: Arc<ServiceRepository>,
    pub cache: CacheService,
}

impl ServicesState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Services, id).await;
    }

    /// Read-through list
    pub async fn list(&self, active_only: bool) -> Result<Vec<ServiceResponse>, PlatformError> {
        let key = CacheEntity::Services.list_key_for(active_only);
        if let Some(cached) = self.cache.get::<Vec<ServiceResponse>>(&key).await {
            return Ok(cached);
        }

        let services: Vec<ServiceResponse> = self.service_repo.find_all(active_only).await?
            .into_iter()
            .map(Into::into)
            .collect();
        self.cache.cache_list(CacheEntity::Services, &key, &services, None).await;
        Ok(services)
    }

    async fn get(&self, id: &str) -> Result<ServiceResponse, PlatformError> {
        let key = CacheEntity::Services.item_key(id);
        if let Some(cached) = self.cache.get::<ServiceResponse>(&key).await {
            return Ok(cached);
        }

        let service: ServiceResponse = self.service_repo.find_by_id(id).await?
            .ok_or_else(|| PlatformError::not_found("Service", id))?
            .into();
        self.cache.set(&key, &service, None).await;
        Ok(service)
    }
}

/// List services
#[utoipa::path(
    get,
    path = "",
    tag = "services",
    operation_id = "getApiServices",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Services by display order", body = ServiceListResponse)
    )
)]
pub async fn list_services(
    State(state): State<ServicesState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<ServiceListResponse>, PlatformError> {
    let services = state.list(filter.active_only()).await?;
    Ok(Json(ServiceListResponse { services }))
}

/// Create service
#[utoipa::path(
    post,
    path = "",
    tag = "services",
    operation_id = "postApiServices",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ServiceEnvelope),
        (status = 400, description = "Validation error or duplicate slug"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_content")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_service(
    State(state): State<ServicesState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceEnvelope>), PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let slug = normalize_slug(&req.slug);
    if state.service_repo.exists_by_slug(&slug).await? {
        return Err(PlatformError::duplicate("Service", "slug", &slug));
    }

    let mut service = Service::new(
        req.title.trim(),
        req.description,
        req.long_description,
        req.icon.trim(),
        &slug,
    )
    .with_features(req.features);
    service.display_order = req.display_order.unwrap_or(0);
    service.is_active = req.is_active.unwrap_or(true);

    state.service_repo.insert(&service).await?;
    state.invalidate(None).await;

    info!(service_id = %service.id, slug = %service.slug, by = %auth.user_id, "Service created");
    Ok((StatusCode::CREATED, Json(ServiceEnvelope { service: service.into() })))
}

/// Get service by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "services",
    operation_id = "getApiServicesById",
    params(("id" = String, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service found", body = ServiceEnvelope),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service(
    State(state): State<ServicesState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceEnvelope>, PlatformError> {
    let service = state.get(&id).await?;
    Ok(Json(ServiceEnvelope { service }))
}

/// Get service by slug
#[utoipa::path(
    get,
    path = "/by-slug/{slug}",
    tag = "services",
    operation_id = "getApiServicesBySlug",
    params(("slug" = String, Path, description = "Service slug")),
    responses(
        (status = 200, description = "Service found", body = ServiceEnvelope),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service_by_slug(
    State(state): State<ServicesState>,
    Path(slug): Path<String>,
) -> Result<Json<ServiceEnvelope>, PlatformError> {
    let slug = normalize_slug(&slug);
    let service = state.service_repo.find_by_slug(&slug).await?
        .ok_or_else(|| PlatformError::not_found("Service", &slug))?;
    Ok(Json(ServiceEnvelope { service: service.into() }))
}

/// Update service
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "services",
    operation_id = "putApiServicesById",
    params(("id" = String, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ServiceEnvelope),
        (status = 400, description = "Validation error or duplicate slug"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_service(
    State(state): State<ServicesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateServiceRequest>,
) -> Result<Json<ServiceEnvelope>, PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let mut service = state.service_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Service", &id))?;

    if let Some(slug) = req.slug.as_deref().map(normalize_slug) {
        if slug != service.slug {
            if state.service_repo.exists_by_slug(&slug).await? {
                return Err(PlatformError::duplicate("Service", "slug", &slug));
            }
            service.slug = slug;
        }
    }
    if let Some(title) = req.title {
        service.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        service.description = description;
    }
    if let Some(long_description) = req.long_description {
        service.long_description = long_description;
    }
    if let Some(icon) = req.icon {
        service.icon = icon.trim().to_string();
    }
    if let Some(features) = req.features {
        service.features = features;
    }
    if let Some(order) = req.display_order {
        service.display_order = order;
    }
    if let Some(active) = req.is_active {
        service.is_active = active;
    }

    service.updated_at = chrono::Utc::now();
    state.service_repo.update(&service).await?;
    state.invalidate(Some(&service.id)).await;

    info!(service_id = %service.id, by = %auth.user_id, "Service updated");
    Ok(Json(ServiceEnvelope { service: service.into() }))
}

/// Delete service
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "services",
    operation_id = "deleteApiServicesById",
    params(("id" = String, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service deleted", body = MessageResponse),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_service(
    State(state): State<ServicesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_content(&auth)?;

    if !state.service_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Service", &id));
    }
    state.invalidate(Some(&id)).await;

    info!(service_id = %id, by = %auth.user_id, "Service deleted");
    Ok(Json(MessageResponse::new("Service deleted successfully")))
}

pub fn services_router(state: ServicesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_services, create_service))
        .routes(routes!(get_service_by_slug))
        .routes(routes!(get_service, update_service, delete_service))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_validation_messages() {
        let req: CreateServiceRequest = serde_json::from_value(serde_json::json!({
            "title": "Web",
            "description": "Sitios web rápidos",
            "longDescription": "Muy corto",
            "icon": "globe",
            "slug": "w"
        })).unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("longDescription must be at least 20"));
        assert!(msg.contains("features must contain at least 1"));
        assert!(msg.contains("slug must be at least 2"));
        assert!(!msg.contains("title"));
    }

    #[test]
    fn test_valid_create() {
        let req: CreateServiceRequest = serde_json::from_value(serde_json::json!({
            "title": "Desarrollo web",
            "description": "Sitios web rápidos",
            "longDescription": "Sitios y aplicaciones web a la medida de tu negocio",
            "icon": "globe",
            "features": ["SEO", "Responsive"],
            "slug": "Desarrollo-Web"
        })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(normalize_slug(&req.slug), "desarrollo-web");
    }

    #[test]
    fn test_update_empty_features_rejected() {
        let req = UpdateServiceRequest { features: Some(vec![]), ..Default::default() };
        assert!(req.validate().is_err());
    }
}
