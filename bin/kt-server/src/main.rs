//! Kothler Server
//!
//! Single process serving:
//! - Public site pages: /, /servicios, /equipo, /portafolio, robots.txt, sitemap.xml
//! - Admin dashboard shell: /dashboard
//! - CMS REST APIs under /api
//! - Health probes under /health
//!
//! ## Configuration
//!
//! Settings come from a TOML file (first CLI argument, or the standard search
//! paths) with `KOTHLER_*` environment overrides. `--example-config` prints a
//! commented TOML template and exits.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KOTHLER_HTTP_PORT` | `3000` | HTTP port |
//! | `KOTHLER_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `KOTHLER_MONGODB_DATABASE` | `kothler` | MongoDB database name |
//! | `KOTHLER_CACHE_BACKEND` | `memory` | `redis`, `memory` or `disabled` |
//! | `KOTHLER_JWT_SECRET` | - | HMAC session signing secret |
//! | `KOTHLER_DEV_MODE` | `false` | Seed development data |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use anyhow::Result;
use tracing::{error, info, warn};
use tokio::{signal, net::TcpListener};

use kt_config::{AppConfig, ConfigLoader};
use kt_cms::auth::auth_service::AuthConfig;
use kt_cms::auth::password_service::{Argon2Config, PasswordPolicy};
use kt_cms::auth::{auth_router, AuthState};
use kt_cms::dashboard::{dashboard_api_router, dashboard_pages_router, DashboardState};
use kt_cms::feature::{features_router, FeaturesState};
use kt_cms::package::{packages_router, PackagesState};
use kt_cms::profile::{profiles_router, ProfilesState};
use kt_cms::project::{projects_router, ProjectsState};
use kt_cms::role::{roles_router, RolesState};
use kt_cms::service::{services_router, ServicesState};
use kt_cms::site::{site_router, SiteState};
use kt_cms::user::{users_router, UsersState};
use kt_cms::shared::indexes::initialize_indexes;
use kt_cms::shared::{health_router, AppState, AuthLayer, HealthState};
use kt_cms::seed::DevDataSeeder;
use kt_cms::{
    AuthService, CacheService, FeatureRepository, PackageRepository, PasswordService,
    ProfileRepository, ProjectRepository, RoleRepository, ServiceRepository, UserRepository,
};

const DEV_JWT_SECRET: &str = "kothler-dev-secret-change-me";

fn load_config() -> Result<AppConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => ConfigLoader::with_path(path).load()?,
        None => AppConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().nth(1).as_deref() == Some("--example-config") {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    kt_common::logging::init_logging("kt-server");

    info!("Starting Kothler Server");

    let mut config = load_config()?;
    if config.dev_mode && config.auth.jwt.secret.is_empty() {
        warn!("No JWT secret configured, using the development secret");
        config.auth.jwt.secret = DEV_JWT_SECRET.to_string();
    }
    let base_url: Arc<str> = Arc::from(config.site.base_url.trim_end_matches('/'));

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", config.mongodb.uri, config.mongodb.database);
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.uri).await?;
    let db = mongo_client.database(&config.mongodb.database);

    let health_state = HealthState::new(Some(db.clone()), Some(env!("CARGO_PKG_VERSION").to_string()));

    if let Err(e) = initialize_indexes(&db).await {
        warn!("Index initialization failed: {}", e);
    }

    if config.dev_mode {
        match DevDataSeeder::new(db.clone()) {
            Ok(seeder) => {
                if let Err(e) = seeder.seed().await {
                    warn!("Dev data seeding skipped: {}", e);
                }
            }
            Err(e) => warn!("Dev data seeder unavailable: {}", e),
        }
    }

    // Repositories
    let user_repo = Arc::new(UserRepository::new(&db));
    let role_repo = Arc::new(RoleRepository::new(&db));
    let profile_repo = Arc::new(ProfileRepository::new(&db));
    let service_repo = Arc::new(ServiceRepository::new(&db));
    let project_repo = Arc::new(ProjectRepository::new(&db));
    let package_repo = Arc::new(PackageRepository::new(&db));
    let feature_repo = Arc::new(FeatureRepository::new(&db));
    info!("Repositories initialized");

    let cache = CacheService::from_config(&config.cache).await;

    // Auth
    let auth_service = Arc::new(AuthService::new(AuthConfig::from_app_config(&config.auth)?)?);
    let password_service = Arc::new(PasswordService::new(
        Argon2Config::default(),
        PasswordPolicy::default(),
    )?);
    info!("Auth services initialized");

    let session = &config.auth.session;
    let app_state = AppState::new(auth_service.clone()).with_cookie_name(session.cookie_name.clone());

    // API states
    let auth_state = AuthState::new(
        auth_service,
        user_repo.clone(),
        role_repo.clone(),
        password_service.clone(),
    )
    .with_session_cookie_settings(&session.cookie_name, session.secure, &session.same_site);
    let users_state = UsersState {
        user_repo: user_repo.clone(),
        role_repo: role_repo.clone(),
        password_service,
        cache: cache.clone(),
    };
    let roles_state = RolesState {
        role_repo: role_repo.clone(),
        user_repo: user_repo.clone(),
        cache: cache.clone(),
    };
    let profiles_state = ProfilesState {
        profile_repo: profile_repo.clone(),
        user_repo: user_repo.clone(),
        cache: cache.clone(),
    };
    let services_state = ServicesState { service_repo, cache: cache.clone() };
    let projects_state = ProjectsState { project_repo, cache: cache.clone() };
    let packages_state = PackagesState { package_repo, cache: cache.clone() };
    let features_state = FeaturesState { feature_repo, cache: cache.clone() };
    let dashboard_state = DashboardState {
        user_repo,
        profile_repo,
        role_repo,
        base_url: base_url.clone(),
    };
    let site_state = SiteState {
        services: services_state.clone(),
        projects: projects_state.clone(),
        packages: packages_state.clone(),
        features: features_state.clone(),
        profiles: profiles_state.clone(),
        base_url,
    };

    // REST APIs, collected into the OpenAPI document
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/auth", auth_router(auth_state))
        .nest("/api/users", users_router(users_state))
        .nest("/api/roles", roles_router(roles_state))
        .nest("/api/profiles", profiles_router(profiles_state))
        .nest("/api/services", services_router(services_state))
        .nest("/api/projects", projects_router(projects_state))
        .nest("/api/packages", packages_router(packages_state))
        .nest("/api/features", features_router(features_state))
        .nest("/api/dashboard", dashboard_api_router(dashboard_state.clone()))
        .split_for_parts();

    if let Some(components) = openapi.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }

    openapi.info.title = "Kothler CMS API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Content, users, roles and sessions for the Kothler site".to_string());

    let app = Router::new()
        .merge(router)
        .merge(site_router(site_state))
        .merge(dashboard_pages_router(dashboard_state))
        .nest("/health", health_router(health_state.clone().with_cache(cache)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http.cors_origins));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    health_state.set_ready();
    info!("Kothler Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Kothler Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
