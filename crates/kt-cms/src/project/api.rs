//! Projects API
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
use crate::project::entity::Project;
use crate::project::repository::ProjectRepository;
use crate::shared::api_common::{ApiJson, ActiveFilter, MessageResponse};
use crate::shared::authorization_service::checks;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::validation::{parse_date, Validator};

const DATE_MESSAGE: &str = "completionDate must be a valid date (YYYY-MM-DD or RFC 3339)";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub client: String,
    /// `YYYY-MM-DD` or RFC 3339
    #[serde(default)]
    pub completion_date: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub link: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateProjectRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        Validator::new()
            .min_len("title", self.title.trim(), 2)
            .min_len("description", &self.description, 10)
            .min_items("images", &self.images, 1)
            .min_len("category", self.category.trim(), 1)
            .min_len("client", self.client.trim(), 1)
            .check(parse_date(&self.completion_date).is_some(), DATE_MESSAGE)
            .min_items("technologies", &self.technologies, 1)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub client: Option<String>,
    pub completion_date: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub link: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateProjectRequest {
    fn validate(&self) -> Result<(), PlatformError> {
        let mut v = Validator::new();
        v.min_len_opt("title", self.title.as_deref().map(str::trim), 2)
            .min_len_opt("description", self.description.as_deref(), 10)
            .min_len_opt("category", self.category.as_deref().map(str::trim), 1)
            .min_len_opt("client", self.client.as_deref().map(str::trim), 1);
        if let Some(images) = &self.images {
            v.min_items("images", images, 1);
        }
        if let Some(technologies) = &self.technologies {
            v.min_items("technologies", technologies, 1);
        }
        if let Some(date) = &self.completion_date {
            v.check(parse_date(date).is_some(), DATE_MESSAGE);
        }
        v.finish()
    }
}

fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub category: String,
    pub client: String,
    pub completion_date: String,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            images: p.images,
            category: p.category,
            client: p.client,
            completion_date: p.completion_date.to_rfc3339(),
            technologies: p.technologies,
            link: p.link,
            display_order: p.display_order,
            is_active: p.is_active,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

impl CacheItem for ProjectResponse {
    fn cache_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectEnvelope {
    pub project: ProjectResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
}

#[derive(Clone)]
pub struct ProjectsState {
    pub project_repo: Arc<ProjectRepository>,
    pub cache: CacheService,
}

impl ProjectsState {
    /// Drop cached lists, and the item when `id` is given
    pub async fn invalidate(&self, id: Option<&str>) {
        self.cache.invalidate(CacheEntity::Projects, id).await;
    }

    /// Read-through list
    pub async fn list(&self, active_only: bool) -> Result<Vec<ProjectResponse>, PlatformError> {
        let key = CacheEntity::Projects.list_key_for(active_only);
        if let Some(cached) = self.cache.get::<Vec<ProjectResponse>>(&key).await {
            return Ok(cached);
        }

        let projects: Vec<ProjectResponse> = self.project_repo.find_all(active_only).await?
            .into_iter()
            .map(Into::into)
            .collect();
        self.cache.cache_list(CacheEntity::Projects, &key, &projects, None).await;
        Ok(projects)
    }

    async fn get(&self, id: &str) -> Result<ProjectResponse, PlatformError> {
        let key = CacheEntity::Projects.item_key(id);
        if let Some(cached) = self.cache.get::<ProjectResponse>(&key).await {
            return Ok(cached);
        }

        let project: ProjectResponse = self.project_repo.find_by_id(id).await?
            .ok_or_else(|| PlatformError::not_found("Project", id))?
            .into();
        self.cache.set(&key, &project, None).await;
        Ok(project)
    }
}

/// List projects
#[utoipa::path(
    get,
    path = "",
    tag = "projects",
    operation_id = "getApiProjects",
    params(ActiveFilter),
    responses(
        (status = 200, description = "Projects by display order", body = ProjectListResponse)
    )
)]
pub async fn list_projects(
    State(state): State<ProjectsState>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<ProjectListResponse>, PlatformError> {
    let projects = state.list(filter.active_only()).await?;
    Ok(Json(ProjectListResponse { projects }))
}

/// Create project
#[utoipa::path(
    post,
    path = "",
    tag = "projects",
    operation_id = "postApiProjects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectEnvelope),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing manage_content")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<ProjectsState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectEnvelope>), PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let completion_date = parse_date(&req.completion_date)
        .ok_or_else(|| PlatformError::validation(DATE_MESSAGE))?;

    let mut project = Project::new(
        req.title.trim(),
        req.description,
        req.category.trim(),
        req.client.trim(),
        completion_date,
    );
    project.images = req.images;
    project.technologies = req.technologies;
    project.link = normalize_link(req.link);
    project.display_order = req.display_order.unwrap_or(0);
    project.is_active = req.is_active.unwrap_or(true);

    state.project_repo.insert(&project).await?;
    state.invalidate(None).await;

    info!(project_id = %project.id, by = %auth.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectEnvelope { project: project.into() })))
}

/// Get project by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "projects",
    operation_id = "getApiProjectsById",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = ProjectEnvelope),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<ProjectsState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectEnvelope>, PlatformError> {
    let project = state.get(&id).await?;
    Ok(Json(ProjectEnvelope { project }))
}

/// Update project
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "projects",
    operation_id = "putApiProjectsById",
    params(("id" = String, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<ProjectsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectEnvelope>, PlatformError> {
    checks::can_manage_content(&auth)?;
    req.validate()?;

    let mut project = state.project_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Project", &id))?;

    if let Some(title) = req.title {
        project.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        project.description = description;
    }
    if let Some(images) = req.images {
        project.images = images;
    }
    if let Some(category) = req.category {
        project.category = category.trim().to_string();
    }
    if let Some(client) = req.client {
        project.client = client.trim().to_string();
    }
    if let Some(date) = req.completion_date.as_deref().and_then(parse_date) {
        project.completion_date = date;
    }
    if let Some(technologies) = req.technologies {
        project.technologies = technologies;
    }
    if req.link.is_some() {
        project.link = normalize_link(req.link);
    }
    if let Some(order) = req.display_order {
        project.display_order = order;
    }
    if let Some(active) = req.is_active {
        project.is_active = active;
    }

    project.updated_at = chrono::Utc::now();
    state.project_repo.update(&project).await?;
    state.invalidate(Some(&project.id)).await;

    info!(project_id = %project.id, by = %auth.user_id, "Project updated");
    Ok(Json(ProjectEnvelope { project: project.into() }))
}

/// Delete project
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "projects",
    operation_id = "deleteApiProjectsById",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<ProjectsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    checks::can_manage_content(&auth)?;

    if !state.project_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Project", &id));
    }
    state.invalidate(Some(&id)).await;

    info!(project_id = %id, by = %auth.user_id, "Project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

pub fn projects_router(state: ProjectsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_projects, create_project))
        .routes(routes!(get_project, update_project, delete_project))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> serde_json::Value {
        serde_json::json!({
            "title": "Tienda en línea",
            "description": "E-commerce for a local bakery",
            "images": ["/img/bakery.png"],
            "category": "web",
            "client": "Panadería Sol",
            "completionDate": "2024-03-15",
            "technologies": ["Next.js", "MongoDB"]
        })
    }

    #[test]
    fn test_valid_project() {
        let req: CreateProjectRequest = serde_json::from_value(valid_json()).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut json = valid_json();
        json["completionDate"] = "next spring".into();
        let req: CreateProjectRequest = serde_json::from_value(json).unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("completionDate"));
    }

    #[test]
    fn test_empty_lists_rejected() {
        let mut json = valid_json();
        json["images"] = serde_json::json!([]);
        json["technologies"] = serde_json::json!([]);
        let req: CreateProjectRequest = serde_json::from_value(json).unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("images"));
        assert!(msg.contains("technologies"));
    }

    #[test]
    fn test_update_validates_present_fields_only() {
        assert!(UpdateProjectRequest::default().validate().is_ok());

        let req = UpdateProjectRequest { completion_date: Some("31/12/2024".into()), ..Default::default() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_link_is_dropped() {
        assert_eq!(normalize_link(Some("  ".into())), None);
        assert_eq!(normalize_link(Some(" https://x.mx ".into())).as_deref(), Some("https://x.mx"));
    }
}
