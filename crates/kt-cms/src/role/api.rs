//! Roles Admin API
//!
//! REST endpoints for role management. Every endpoint, reads included,
//! requires `manage_roles`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheEntity, CacheService};
use crate::role::entity::{permissions, Role};
use crate::role::repository::RoleRepository;
use crate::user::repository::UserRepository;
use crate::shared::api_common::{ApiJson, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::Validator;

/// Create role request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl CreateRoleRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        let mut v = Validator::new();
        v.min_len("name", self.name.trim(), 2)
            .min_len("description", self.description.trim(), 5);
        check_permission_tokens(&mut v, &self.permissions);
        v.finish()
    }
}

/// Update role request (all fields optional)
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_default: Option<bool>,
}

impl UpdateRoleRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        let mut v = Validator::new();
        v.min_len_opt("name", self.name.as_deref().map(str::trim), 2)
            .min_len_opt("description", self.description.as_deref().map(str::trim), 5);
        if let Some(perms) = &self.permissions {
            check_permission_tokens(&mut v, perms);
        }
        v.finish()
    }
}

fn check_permission_tokens(v: &mut Validator, perms: &[String]) {
    v.check(
        perms.iter().all(|p| !p.trim().is_empty()),
        "permissions must not contain empty entries",
    );
}

/// Role response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            permissions: r.permissions,
            is_default: r.is_default,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleEnvelope {
    pub role: RoleResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleListResponse {
    pub roles: Vec<RoleResponse>,
}

/// A known permission token
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub permission: String,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionListResponse {
    pub permissions: Vec<PermissionResponse>,
}

/// Roles service state
#[derive(Clone)]
pub struct RolesState {
    pub role_repo: Arc<RoleRepository>,
    pub user_repo: Arc<UserRepository>,
    pub cache: CacheService,
}

impl RolesState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Roles, id).await;
    }
}

/// List roles
#[utoipa::path(
    get,
    path = "",
    tag = "roles",
    operation_id = "getApiRoles",
    responses(
        (status = 200, description = "Roles sorted by name", body = RoleListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_roles")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_roles(
    State(state): State<RolesState>,
    auth: Authenticated,
) -> Result<Json<RoleListResponse>, PlatformError> {
    checks::can_manage_roles(&auth)?;

    let roles = state.role_repo.find_all().await?;
    Ok(Json(RoleListResponse {
        roles: roles.into_iter().map(Into::into).collect(),
    }))
}

/// Create a new role
#[utoipa::path(
    post,
    path = "",
    tag = "roles",
    operation_id = "postApiRoles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleEnvelope),
        (status = 400, description = "Validation error or duplicate name"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_roles")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<RolesState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleEnvelope>), PlatformError> {
    checks::can_manage_roles(&auth)?;
    req.validate()?;

    let name = req.name.trim().to_string();
    if state.role_repo.exists_by_name(&name).await? {
        return Err(PlatformError::duplicate("Role", "name", &name));
    }

    let role = Role::new(name, req.description)
        .with_permissions(req.permissions)
        .with_default(req.is_default);

    state.role_repo.insert(&role).await?;
    state.invalidate(None).await;

    info!(role_id = %role.id, name = %role.name, by = %auth.user_id, "Role created");
    Ok((StatusCode::CREATED, Json(RoleEnvelope { role: role.into() })))
}

/// List known permission tokens
#[utoipa::path(
    get,
    path = "/permissions",
    tag = "roles",
    operation_id = "getApiRolesPermissions",
    responses(
        (status = 200, description = "Known permissions", body = PermissionListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_permissions(
    auth: Authenticated,
) -> Result<Json<PermissionListResponse>, PlatformError> {
    checks::can_manage_roles(&auth)?;

    let permissions = permissions::ALL
        .iter()
        .map(|p| PermissionResponse {
            permission: p.to_string(),
            description: permissions::description(p).unwrap_or_default().to_string(),
        })
        .collect();

    Ok(Json(PermissionListResponse { permissions }))
}

/// Get role by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "roles",
    operation_id = "getApiRolesById",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = RoleEnvelope),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_role(
    State(state): State<RolesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<RoleEnvelope>, PlatformError> {
    checks::can_manage_roles(&auth)?;

    let role = state.role_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Role", &id))?;

    Ok(Json(RoleEnvelope { role: role.into() }))
}

/// Update role
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "roles",
    operation_id = "putApiRolesById",
    params(("id" = String, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleEnvelope),
        (status = 400, description = "Validation error or duplicate name"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<RolesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<Json<RoleEnvelope>, PlatformError> {
    checks::can_manage_roles(&auth)?;
    req.validate()?;

    let mut role = state.role_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Role", &id))?;

    if let Some(name) = req.name.map(|n| n.trim().to_string()) {
        if name != role.name {
            if state.role_repo.exists_by_name(&name).await? {
                return Err(PlatformError::duplicate("Role", "name", &name));
            }
            role.name = name;
        }
    }
    if let Some(description) = req.description {
        role.description = description;
    }
    if let Some(perms) = req.permissions {
        role.set_permissions(perms);
    }
    if let Some(is_default) = req.is_default {
        role.is_default = is_default;
    }

    role.updated_at = chrono::Utc::now();
    state.role_repo.update(&role).await?;
    state.invalidate(Some(&role.id)).await;

    info!(role_id = %role.id, by = %auth.user_id, "Role updated");
    Ok(Json(RoleEnvelope { role: role.into() }))
}

/// Delete role
///
/// Refused with 400 while users still reference the role.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "roles",
    operation_id = "deleteApiRolesById",
    params(("id" = String, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 400, description = "Role still assigned to users"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_role(
    State(state): State<RolesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_roles(&auth)?;

    if state.role_repo.find_by_id(&id).await?.is_none() {
        return Err(PlatformError::not_found("Role", &id));
    }

    let users_with_role = state.user_repo.count_by_role(&id).await?;
    if users_with_role > 0 {
        return Err(PlatformError::in_use(
            "Cannot delete role with associated users",
            users_with_role,
        ));
    }

    state.role_repo.delete(&id).await?;
    state.invalidate(Some(&id)).await;

    info!(role_id = %id, by = %auth.user_id, "Role deleted");
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}

pub fn roles_router(state: RolesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_roles, create_role))
        .routes(routes!(list_permissions))
        .routes(routes!(get_role, update_role, delete_role))
        .with_state(state)
}
