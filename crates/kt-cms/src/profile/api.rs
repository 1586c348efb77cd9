//! Profiles API
//!
//! Public profiles are readable by anyone. A private profile needs a valid
//! session. Writes need `manage_profiles`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::{IntoParams, ToSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheEntity, CacheItem, CacheService};
use crate::profile::entity::{Profile, ProfileLinks};
use crate::profile::repository::ProfileRepository;
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use crate::shared::api_common::{ApiJson, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::{Authenticated, OptionalAuth};
use crate::shared::validation::Validator;

/// `?public=true` limits the list to public profiles
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublicFilter {
    pub public: Option<String>,
}

impl PublicFilter {
    pub fn public_only(&self) -> bool {
        self.public.as_deref() == Some("true")
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub bio: String,
    pub image: Option<String>,
    #[serde(default)]
    pub links: ProfileLinks,
    pub is_public: Option<bool>,
    pub display_order: Option<i32>,
}

impl CreateProfileRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len("userId", self.user_id.trim(), 1)
            .min_len("position", self.position.trim(), 2)
            .min_len("bio", &self.bio, 10)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub position: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub links: Option<ProfileLinks>,
    pub is_public: Option<bool>,
    pub display_order: Option<i32>,
}

impl UpdateProfileRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len_opt("position", self.position.as_deref().map(str::trim), 2)
            .min_len_opt("bio", self.bio.as_deref(), 10)
            .finish()
    }
}

fn non_blank(image: Option<String>) -> Option<String> {
    image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty())
}

/// The owning user as shown on a profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for ProfileUser {
    fn from(u: &User) -> Self {
        Self { id: u.id.clone(), name: u.name.clone(), email: u.email.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    /// `null` when the owning user no longer exists
    pub user: Option<ProfileUser>,
    pub position: String,
    pub bio: String,
    pub image: String,
    pub links: ProfileLinks,
    pub is_public: bool,
    pub display_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileResponse {
    pub fn new(profile: Profile, user: Option<&User>) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            user: user.map(ProfileUser::from),
            position: profile.position,
            bio: profile.bio,
            image: profile.image,
            links: profile.links,
            is_public: profile.is_public,
            display_order: profile.display_order,
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

impl CacheItem for ProfileResponse {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileEnvelope {
    pub profile: ProfileResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileListResponse {
    pub profiles: Vec<ProfileResponse>,
}

#[derive(Clone)]
pub struct ProfilesState {
    pub profile_repo: Arc<ProfileRepository>,
    pub user_repo: Arc<UserRepository>,
    pub cache: CacheService,
}

impl ProfilesState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Profiles, id).await;
    }

    async fn view(&self, profile: Profile) -> Result<ProfileResponse, PlatformError> {
        let user = self.user_repo.find_by_id(&profile.user_id).await?;
        Ok(ProfileResponse::new(profile, user.as_ref()))
    }

    /// Read-through list with owning users populated
    pub async fn list(&self, public_only: bool) -> Result<Vec<ProfileResponse>, PlatformError> {
        let key = CacheEntity::Profiles.list_key_for(public_only);
        if let Some(cached) = self.cache.get::<Vec<ProfileResponse>>(&key).await {
            return Ok(cached);
        }

        let profiles = self.profile_repo.find_all(public_only).await?;

        let mut user_ids: Vec<String> = profiles.iter().map(|p| p.user_id.clone()).collect();
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<String, User> = self.user_repo.find_by_ids(&user_ids).await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let profiles: Vec<ProfileResponse> = profiles
            .into_iter()
            .map(|p| {
                let user = users.get(&p.user_id);
                ProfileResponse::new(p, user)
            })
            .collect();
        self.cache.cache_list(CacheEntity::Profiles, &key, &profiles, None).await;
        Ok(profiles)
    }

    async fn get(&self, id: &str) -> Result<ProfileResponse, PlatformError> {
        let key = CacheEntity::Profiles.item_key(id);
        if let Some(cached) = self.cache.get::<ProfileResponse>(&key).await {
            return Ok(cached);
        }

        let profile = self.profile_repo.find_by_id(id).await?
            .ok_or_else(|| PlatformError::not_found("Profile", id))?;
        let profile = self.view(profile).await?;
        self.cache.set(&key, &profile, None).await;
        Ok(profile)
    }
}

/// List profiles
#[utoipa::path(
    get,
    path = "",
    tag = "profiles",
    operation_id = "getApiProfiles",
    params(PublicFilter),
    responses(
        (status = 200, description = "Profiles by display order", body = ProfileListResponse)
    )
)]
pub async fn list_profiles(
    State(state): State<ProfilesState>,
    Query(filter): Query<PublicFilter>,
) -> Result<Json<ProfileListResponse>, PlatformError> {
    let profiles = state.list(filter.public_only()).await?;
    Ok(Json(ProfileListResponse { profiles }))
}

/// Create profile
#[utoipa::path(
    post,
    path = "",
    tag = "profiles",
    operation_id = "postApiProfiles",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileEnvelope),
        (status = 400, description = "Validation error, unknown user or user already has a profile"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_profiles")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    State(state): State<ProfilesState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileEnvelope>), PlatformError> {
    checks::can_manage_profiles(&auth)?;
    req.validate()?;

    let user_id = req.user_id.trim();
    let user = state.user_repo.find_by_id(user_id).await?
        .ok_or_else(|| PlatformError::validation("User not found"))?;

    if state.profile_repo.exists_by_user_id(user_id).await? {
        return Err(PlatformError::duplicate("Profile", "userId", user_id));
    }

    let mut profile = Profile::new(user_id, req.position.trim(), req.bio);
    if let Some(image) = non_blank(req.image) {
        profile.image = image;
    }
    profile.links = req.links;
    profile.is_public = req.is_public.unwrap_or(true);
    profile.display_order = req.display_order.unwrap_or(0);

    state.profile_repo.insert(&profile).await?;
    state.invalidate(None).await;

    info!(profile_id = %profile.id, user_id = %user.id, by = %auth.user_id, "Profile created");
    let profile = ProfileResponse::new(profile, Some(&user));
    Ok((StatusCode::CREATED, Json(ProfileEnvelope { profile })))
}

/// Get profile by ID
///
/// Private profiles answer 401 without a session.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "profiles",
    operation_id = "getApiProfilesById",
    params(("id" = String, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile found", body = ProfileEnvelope),
        (status = 401, description = "Private profile, no session"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    State(state): State<ProfilesState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
) -> Result<Json<ProfileEnvelope>, PlatformError> {
    let profile = state.get(&id).await?;
    if !profile.is_public && auth.is_none() {
        return Err(PlatformError::unauthorized("Authentication required"));
    }
    Ok(Json(ProfileEnvelope { profile }))
}

/// Update profile
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "profiles",
    operation_id = "putApiProfilesById",
    params(("id" = String, Path, description = "Profile ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<ProfilesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileEnvelope>, PlatformError> {
    checks::can_manage_profiles(&auth)?;
    req.validate()?;

    let mut profile = state.profile_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Profile", &id))?;

    if let Some(position) = req.position {
        profile.position = position.trim().to_string();
    }
    if let Some(bio) = req.bio {
        profile.bio = bio;
    }
    if let Some(image) = non_blank(req.image) {
        profile.image = image;
    }
    if let Some(links) = req.links {
        profile.links.merge(links);
    }
    if let Some(public) = req.is_public {
        profile.is_public = public;
    }
    if let Some(order) = req.display_order {
        profile.display_order = order;
    }

    profile.updated_at = chrono::Utc::now();
    state.profile_repo.update(&profile).await?;
    state.invalidate(Some(&profile.id)).await;

    info!(profile_id = %profile.id, by = %auth.user_id, "Profile updated");
    let profile = state.view(profile).await?;
    Ok(Json(ProfileEnvelope { profile }))
}

/// Delete profile
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "profiles",
    operation_id = "deleteApiProfilesById",
    params(("id" = String, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile deleted", body = MessageResponse),
        (status = 404, description = "Profile not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_profile(
    State(state): State<ProfilesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_profiles(&auth)?;

    if !state.profile_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Profile", &id));
    }
    state.invalidate(Some(&id)).await;

    info!(profile_id = %id, by = %auth.user_id, "Profile deleted");
    Ok(Json(MessageResponse::new("Profile deleted successfully")))
}

pub fn profiles_router(state: ProfilesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_profiles, create_profile))
        .routes(routes!(get_profile, update_profile, delete_profile))
        .with_state(state)
}
