//! Features API
//!
//! Reads are public and read-through cached; writes need `manage_content`.

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
use crate::feature::entity::Feature;
use crate::feature::repository::FeatureRepository;
use crate::shared::api_common::{ApiJson, ActiveFilter, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::Validator;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeatureRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateFeatureRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len("title", self.title.trim(), 2)
            .min_len("description", &self.description, 10)
            .min_len("icon", self.icon.trim(), 1)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeatureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateFeatureRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len_opt("title", self.title.as_deref().map(str::trim), 2)
            .min_len_opt("description", self.description.as_deref(), 10)
            .min_len_opt("icon", self.icon.as_deref().map(str::trim), 1)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Feature> for FeatureResponse {
    fn from(f: Feature) -> Self {
        Self {
            id: f.id,
            title: f.title,
            description: f.description,
            icon: f.icon,
            display_order: f.display_order,
            is_active: f.is_active,
            created_at: f.created_at.to_rfc3339(),
            updated_at: f.updated_at.to_rfc3339(),
        }
    }
}

impl CacheItem for FeatureResponse {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeatureEnvelope {
    pub feature: FeatureResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeatureListResponse {
    pub features: Vec<FeatureResponse>,
}

#[derive(Clone)]
pub struct FeaturesState {
    pub feature_repo: Arc<FeatureRepository>,
    pub cache: CacheService,
}

impl FeaturesState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Features, id).await;
    }

    /// Read-through list
    pub async fn list(&self, active_only: bool) -> Result<Vec<FeatureResponse>, PlatformError> {
        let key = CacheEntity::Features.list_key_for(active_only);
        if let Some(cached) = self.cache.get::<Vec<FeatureResponse>>(&key).await {
            return Ok(cached);
        }

        let features: Vec<FeatureResponse> = self.feature_repo.find_all(active_only).await?
            .into_iter()
            .map(Into::into)
            .collect();
        self.cache.cache_list(CacheEntity::Features, &key, &features, None).await;
        Ok(features)
    }

    async fn get(&self, id: &str) -> Result<FeatureResponse, PlatformError> {
        let key = CacheEntity::Features.item_key(id);
        if let Some(cached) = self.cache.get::<FeatureResponse>(&key).await {
            return Ok(cached);
        }

        let feature: FeatureResponse = self.feature_repo.find_by_id(id).await?
            .ok_or_else(|| PlatformError::not_found("Feature", id))?
            .into();
        self.cache.set(&key, &feature, None).await;
        Ok(feature)
    }
}

/// List features
#[utoipa::path(
    get,
    path = "",
    tag = "features",
    operation_id = "getApiFeatures",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Features by display order", body = FeatureListResponse)
    )
)]
pub async fn list_features(
    State(state): State<FeaturesState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<FeatureListResponse>, PlatformError> {
    let features = state.list(filter.active_only()).await?;
    Ok(Json(FeatureListResponse { features }))
}

/// Create feature
#[utoipa::path(
    post,
    path = "",
    tag = "features",
    operation_id = "postApiFeatures",
    request_body = CreateFeatureRequest,
    responses(
        (status = 201, description = "Feature created", body = FeatureEnvelope),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_content")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_feature(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<FeatureEnvelope>), PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let feature = Feature::new(req.title.trim(), req.description, req.icon.trim())
        .with_display_order(req.display_order.unwrap_or(0))
        .with_active(req.is_active.unwrap_or(true));

    state.feature_repo.insert(&feature).await?;
    state.invalidate(None).await;

    info!(feature_id = %feature.id, by = %auth.user_id, "Feature created");
    Ok((StatusCode::CREATED, Json(FeatureEnvelope { feature: feature.into() })))
}

/// Get feature by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "features",
    operation_id = "getApiFeaturesById",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature found", body = FeatureEnvelope),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn get_feature(
    State(state): State<FeaturesState>,
    Path(id): Path<String>,
) -> Result<Json<FeatureEnvelope>, PlatformError> {
    let feature = state.get(&id).await?;
    Ok(Json(FeatureEnvelope { feature }))
}

/// Update feature
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "features",
    operation_id = "putApiFeaturesById",
    params(("id" = String, Path, description = "Feature ID")),
    request_body = UpdateFeatureRequest,
    responses(
        (status = 200, description = "Feature updated", body = FeatureEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_feature(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateFeatureRequest>,
) -> Result<Json<FeatureEnvelope>, PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let mut feature = state.feature_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Feature", &id))?;

    if let Some(title) = req.title {
        feature.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        feature.description = description;
    }
    if let Some(icon) = req.icon {
        feature.icon = icon.trim().to_string();
    }
    if let Some(order) = req.display_order {
        feature.display_order = order;
    }
    if let Some(active) = req.is_active {
        feature.is_active = active;
    }

    feature.updated_at = chrono::Utc::now();
    state.feature_repo.update(&feature).await?;
    state.invalidate(Some(&feature.id)).await;

    info!(feature_id = %feature.id, by = %auth.user_id, "Feature updated");
    Ok(Json(FeatureEnvelope { feature: feature.into() }))
}

/// Delete feature
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "features",
    operation_id = "deleteApiFeaturesById",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature deleted", body = MessageResponse),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_feature(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_content(&auth)?;

    if !state.feature_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Feature", &id));
    }
    state.invalidate(Some(&id)).await;

    info!(feature_id = %id, by = %auth.user_id, "Feature deleted");
    Ok(Json(MessageResponse::new("Feature deleted successfully")))
}

pub fn features_router(state: FeaturesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_features, create_feature))
        .routes(routes!(get_feature, update_feature, delete_feature))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fail_validation() {
        let req: CreateFeatureRequest = serde_json::from_str(r#"{"title":"X"}"#).unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("title must be at least 2"));
        assert!(msg.contains("description must be at least 10"));
        assert!(msg.contains("icon must be at least 1"));
    }

    #[test]
    fn test_whitespace_title_is_too_short() {
        let req: CreateFeatureRequest = serde_json::from_str(
            r#"{"title":"  A  ","description":"Long enough text","icon":"zap"}"#,
        ).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_valid_create() {
        let req: CreateFeatureRequest = serde_json::from_str(
            r#"{"title":"Fast","description":"Pages load quickly","icon":"zap","displayOrder":2}"#,
        ).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.display_order, Some(2));
        assert_eq!(req.is_active, None);
    }

    #[test]
    fn test_response_shape() {
        let feature = Feature::new("Fast", "Pages load quickly", "zap");
        let json = serde_json::to_value(FeatureEnvelope { feature: feature.into() }).unwrap();
        assert_eq!(json["feature"]["isActive"], true);
        assert_eq!(json["feature"]["displayOrder"], 0);
    }
}
