//! Users Admin API
//!
//! Every endpoint requires `manage_users`. Password hashes never appear in
//! responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::auth::password_service::PasswordService;
use crate::cache::{CacheEntity, CacheService};
use crate::role::entity::Role;
use crate::role::repository::RoleRepository;
use crate::user::entity::{normalize_email, User};
use crate::user::repository::UserRepository;
use crate::shared::api_common::{ApiJson, MessageResponse, PaginationMeta, PaginationParams};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::Validator;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role_id: String,
}

impl CreateUserRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .email("email", &self.email)
            .min_len("password", &self.password, 8)
            .min_len("name", self.name.trim(), 2)
            .min_len("roleId", self.role_id.trim(), 1)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role_id: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len_opt("name", self.name.as_deref().map(str::trim), 2)
            .min_len_opt("roleId", self.role_id.as_deref().map(str::trim), 1)
            .min_len_opt("password", self.password.as_deref(), 8)
            .finish()
    }
}

/// Role reference embedded in user views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleRef {
    pub id: String,
    pub name: String,
}

impl From<&Role> for RoleRef {
    fn from(r: &Role) -> Self {
        Self { id: r.id.clone(), name: r.name.clone() }
    }
}

/// User view without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    /// `null` when the referenced role no longer exists
    pub role: Option<RoleRef>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn new(user: User, role: Option<&Role>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: role.map(RoleRef::from),
            is_active: user.is_active,
            last_login: user.last_login.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Clone)]
pub struct UsersState {
    pub user_repo: Arc<UserRepository>,
    pub role_repo: Arc<RoleRepository>,
    pub password_service: Arc<PasswordService>,
    pub cache: CacheService,
}

impl UsersState {
    async fn view(&self, user: User) -> Result<UserResponse, PlatformError> {
        let role = self.role_repo.find_by_id(&user.role).await?;
        Ok(UserResponse::new(user, role.as_ref()))
    }

    /// Profiles embed user name and email, so both caches go stale together
    pub async fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(CacheEntity::Users, Some(user_id)).await;
        self.cache.invalidate(CacheEntity::Profiles, None).await;
        self.cache.invalidate_pattern("profile:*").await;
    }
}

/// List users
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    operation_id = "getApiUsers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users, newest first", body = UserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_users")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    auth: Authenticated,
    Query(params): Query<PaginationParams>,
) -> Result<Json<UserListResponse>, PlatformError> {
    checks::can_manage_users(&auth)?;

    let users = state.user_repo.find_page(params.skip(), params.limit() as i64).await?;
    let total = state.user_repo.count().await?;

    let mut role_ids: Vec<String> = users.iter().map(|u| u.role.clone()).collect();
    role_ids.sort();
    role_ids.dedup();
    let roles: HashMap<String, Role> = state.role_repo.find_by_ids(&role_ids).await?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();

    let users = users
        .into_iter()
        .map(|u| {
            let role = roles.get(&u.role);
            UserResponse::new(u, role)
        })
        .collect();

    Ok(Json(UserListResponse {
        users,
        pagination: PaginationMeta::new(&params, total),
    }))
}

/// Create user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    operation_id = "postApiUsers",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Validation error, duplicate email or unknown role")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), PlatformError> {
    checks::can_manage_users(&auth)?;
    req.validate()?;

    let email = normalize_email(&req.email);
    if state.user_repo.exists_by_email(&email).await? {
        return Err(PlatformError::duplicate("User", "email", &email));
    }

    let role = state.role_repo.find_by_id(&req.role_id).await?
        .ok_or_else(|| PlatformError::validation("Role not found"))?;

    let hash = state.password_service.hash_password(&req.password)?;
    let user = User::new(&email, hash, req.name.trim(), &role.id);
    state.user_repo.insert(&user).await?;
    state.invalidate(&user.id).await;

    info!(user_id = %user.id, role = %role.name, by = %auth.user_id, "User created");
    Ok((StatusCode::CREATED, Json(UserEnvelope { user: UserResponse::new(user, Some(&role)) })))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    operation_id = "getApiUsersById",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UserEnvelope>, PlatformError> {
    checks::can_manage_users(&auth)?;

    let user = state.user_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("User", &id))?;

    Ok(Json(UserEnvelope { user: state.view(user).await? }))
}

/// Update user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    operation_id = "putApiUsersById",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Validation error or unknown role"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, PlatformError> {
    checks::can_manage_users(&auth)?;
    req.validate()?;

    let mut user = state.user_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("User", &id))?;

    if let Some(role_id) = req.role_id {
        let role = state.role_repo.find_by_id(&role_id).await?
            .ok_or_else(|| PlatformError::validation("Role not found"))?;
        user.role = role.id;
    }
    if let Some(name) = req.name {
        user.name = name.trim().to_string();
    }
    if let Some(is_active) = req.is_active {
        user.is_active = is_active;
    }
    if let Some(password) = req.password {
        user.password = state.password_service.hash_password(&password)?;
    }

    user.updated_at = chrono::Utc::now();
    state.user_repo.update(&user).await?;
    state.invalidate(&user.id).await;

    info!(user_id = %user.id, by = %auth.user_id, "User updated");
    Ok(Json(UserEnvelope { user: state.view(user).await? }))
}

/// Delete user
///
/// Deleting your own account is refused with 400.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    operation_id = "deleteApiUsersById",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Attempt to delete own account"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_users(&auth)?;

    if id == auth.user_id {
        return Err(PlatformError::validation("Cannot delete your own account"));
    }

    if state.user_repo.find_by_id(&id).await?.is_none() {
        return Err(PlatformError::not_found("User", &id));
    }

    state.user_repo.delete(&id).await?;
    state.invalidate(&id).await;

    info!(user_id = %id, by = %auth.user_id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user, update_user, delete_user))
        .with_state(state)
}
