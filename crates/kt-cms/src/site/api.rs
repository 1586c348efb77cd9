//! Public site pages
//!
//! - GET / - Home
//! - GET /servicios - Services
//! - GET /equipo - Team
//! - GET /portafolio - Portfolio
//! - GET /robots.txt, GET /sitemap.xml

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::feature::FeaturesState;
use crate::package::PackagesState;
use crate::profile::ProfilesState;
use crate::project::ProjectsState;
use crate::service::ServicesState;
use crate::shared::error::PlatformError;
use crate::site::render;
use crate::site::seo::{self, Metadata, Page};

#[derive(Clone)]
pub struct SiteState {
    pub services: ServicesState,
    pub projects: ProjectsState,
    pub packages: PackagesState,
    pub features: FeaturesState,
    pub profiles: ProfilesState,
    pub base_url: Arc<str>,
}

impl SiteState {
    fn metadata(&self, page: Page) -> Metadata {
        Metadata::for_page(page, &self.base_url)
    }
}

pub async fn home_page(State(state): State<SiteState>) -> Result<Html<String>, PlatformError> {
    let services = state.services.list(true).await?;
    let projects = state.projects.list(true).await?;
    let packages = state.packages.list(true).await?;
    let features = state.features.list(true).await?;

    let mut body = String::from("<header>\n<h1>Kothler</h1>\n<p>Precisión y crecimiento</p>\n</header>\n");
    body.push_str(&render::services_section(&services, false));
    body.push_str(&render::features_section(&features));
    body.push_str(&render::projects_section(&projects));
    body.push_str(&render::packages_section(&packages));

    let json_ld = [
        seo::organization_schema(&state.base_url),
        seo::website_schema(&state.base_url),
    ];
    Ok(Html(render::document(&state.metadata(Page::Home), &json_ld, &body)))
}

pub async fn services_page(State(state): State<SiteState>) -> Result<Html<String>, PlatformError> {
    let services = state.services.list(true).await?;

    let json_ld: Vec<_> = services
        .iter()
        .map(|s| seo::service_schema(&s.title, &s.description, None, None))
        .collect();
    let body = render::services_section(&services, true);
    Ok(Html(render::document(&state.metadata(Page::Services), &json_ld, &body)))
}

pub async fn team_page(State(state): State<SiteState>) -> Result<Html<String>, PlatformError> {
    let profiles = state.profiles.list(true).await?;

    let json_ld: Vec<_> = profiles
        .iter()
        .map(|p| {
            let name = p.user.as_ref().map(|u| u.name.as_str()).unwrap_or_default();
            let same_as: Vec<&str> = p.links.present().into_iter().map(|(_, url)| url).collect();
            seo::person_schema(name, &p.position, &p.bio, Some(p.image.as_str()), &same_as)
        })
        .collect();
    let body = render::team_section(&profiles);
    Ok(Html(render::document(&state.metadata(Page::Team), &json_ld, &body)))
}

pub async fn portfolio_page(State(state): State<SiteState>) -> Result<Html<String>, PlatformError> {
    let projects = state.projects.list(true).await?;
    let body = render::projects_section(&projects);
    Ok(Html(render::document(&state.metadata(Page::Portfolio), &[], &body)))
}

pub async fn robots_txt(State(state): State<SiteState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        seo::robots_txt(&state.base_url),
    )
}

pub async fn sitemap_xml(State(state): State<SiteState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        seo::sitemap_xml(&state.base_url),
    )
}

pub fn site_router(state: SiteState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/servicios", get(services_page))
        .route("/equipo", get(team_page))
        .route("/portafolio", get(portfolio_page))
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap_xml))
        .with_state(state)
}
