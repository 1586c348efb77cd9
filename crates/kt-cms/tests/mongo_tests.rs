//! CMS Persistence Tests
//!
//! Drives the routers against a throwaway MongoDB container, covering the
//! guards that depend on stored data. Needs a Docker daemon:
//! `cargo test -p kt-cms --test mongo_tests -- --ignored`

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers::{runners::AsyncRunner, ContainerAsync};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

use kt_cms::auth::auth_service::AuthConfig;
use kt_cms::auth::password_service::{Argon2Config, PasswordPolicy};
use kt_cms::auth::{auth_router, AuthState};
use kt_cms::package::{packages_router, PackagesState};
use kt_cms::role::{roles_router, RolesState};
use kt_cms::service::{services_router, ServicesState};
use kt_cms::shared::indexes::initialize_indexes;
use kt_cms::shared::{AppState, AuthLayer};
use kt_cms::user::{users_router, UsersState};
use kt_cms::{
    permissions, AuthService, CacheEntity, CacheService, PackageRepository, PasswordService, Role,
    RoleRepository, ServiceRepository, User, UserRepository,
};

const SESSION_SECS: i64 = 7200;

struct Fixture {
    _container: ContainerAsync<Mongo>,
    auth_service: Arc<AuthService>,
    password_service: Arc<PasswordService>,
    user_repo: Arc<UserRepository>,
    role_repo: Arc<RoleRepository>,
    package_repo: Arc<PackageRepository>,
    cache: CacheService,
    router: Router,
    admin_token: String,
    admin_role: Role,
}

impl Fixture {
    async fn start() -> Self {
        let container = Mongo::default().start().await.unwrap();
        let host = container.get_host().await.unwrap();
        let port = container.get_host_port_ipv4(27017).await.unwrap();
        let client = mongodb::Client::with_uri_str(format!("mongodb://{}:{}", host, port))
            .await
            .unwrap();
        let db = client.database("kothler_it");
        initialize_indexes(&db).await.unwrap();

        let auth_service = Arc::new(AuthService::new(AuthConfig {
            secret_key: "persistence-test-secret".to_string(),
            session_expiry_secs: SESSION_SECS,
            ..AuthConfig::default()
        }).unwrap());
        let password_service = Arc::new(
            PasswordService::new(Argon2Config::testing(), PasswordPolicy::default()).unwrap(),
        );
        let user_repo = Arc::new(UserRepository::new(&db));
        let role_repo = Arc::new(RoleRepository::new(&db));
        let package_repo = Arc::new(PackageRepository::new(&db));
        let cache = CacheService::memory();

        let admin_role = Role::new("admin", "Full access").with_permissions(permissions::ALL.iter().copied());
        role_repo.insert(&admin_role).await.unwrap();
        let admin = User::new(
            "admin@kothler.mx",
            password_service.hash_password("admin-password").unwrap(),
            "Admin",
            &admin_role.id,
        );
        user_repo.insert(&admin).await.unwrap();
        let admin_token = auth_service.generate_session_token(&admin, &admin_role).unwrap();

        let (router, _openapi) = OpenApiRouter::new()
            .nest("/api/auth", auth_router(AuthState::new(
                auth_service.clone(),
                user_repo.clone(),
                role_repo.clone(),
                password_service.clone(),
            )))
            .nest("/api/users", users_router(UsersState {
                user_repo: user_repo.clone(),
                role_repo: role_repo.clone(),
                password_service: password_service.clone(),
                cache: cache.clone(),
            }))
            .nest("/api/roles", roles_router(RolesState {
                role_repo: role_repo.clone(),
                user_repo: user_repo.clone(),
                cache: cache.clone(),
            }))
            .nest("/api/services", services_router(ServicesState {
                service_repo: Arc::new(ServiceRepository::new(&db)),
                cache: cache.clone(),
            }))
            .nest("/api/packages", packages_router(PackagesState {
                package_repo: package_repo.clone(),
                cache: cache.clone(),
            }))
            .split_for_parts();
        let router = router.layer(AuthLayer::new(AppState::new(auth_service.clone())));

        Self {
            _container: container,
            auth_service,
            password_service,
            user_repo,
            role_repo,
            package_repo,
            cache,
            router,
            admin_token,
            admin_role,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.admin_token));
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn insert_user(&self, email: &str, password: &str, role: &Role) -> User {
        let user = User::new(email, self.password_service.hash_password(password).unwrap(), "Test User", &role.id);
        self.user_repo.insert(&user).await.unwrap();
        user
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn package_body(name: &str) -> Value {
    json!({
        "name": name,
        "title": "Plan",
        "description": "Hosting and maintenance",
        "price": 1499.0
    })
}

fn service_body(slug: &str) -> Value {
    json!({
        "title": "Desarrollo web",
        "description": "Sitios rápidos y accesibles",
        "longDescription": "Diseño, desarrollo y despliegue de sitios a medida",
        "icon": "code",
        "features": ["SEO"],
        "slug": slug
    })
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_duplicate_email_is_rejected() {
    let fixture = Fixture::start().await;
    let body = json!({
        "email": "Ana@Kothler.mx",
        "password": "long-enough",
        "name": "Ana",
        "roleId": fixture.admin_role.id,
    });

    let response = fixture.send("POST", "/api/users", Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut again = body;
    again["email"] = json!("ana@kothler.mx");
    let response = fixture.send("POST", "/api/users", Some(again)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "DUPLICATE");
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_duplicate_role_name_is_rejected() {
    let fixture = Fixture::start().await;
    let body = json!({ "name": "publisher", "description": "Publishes content" });

    let response = fixture.send("POST", "/api/roles", Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = fixture.send("POST", "/api/roles", Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "DUPLICATE");
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_duplicate_service_slug_is_rejected() {
    let fixture = Fixture::start().await;

    let response = fixture.send("POST", "/api/services", Some(service_body("desarrollo-web"))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = fixture.send("POST", "/api/services", Some(service_body("desarrollo-web"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "DUPLICATE");
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_role_in_use_cannot_be_deleted() {
    let fixture = Fixture::start().await;
    let editor = Role::new("editor", "Content editor").with_permissions([permissions::MANAGE_CONTENT]);
    fixture.role_repo.insert(&editor).await.unwrap();
    fixture.insert_user("e1@kothler.mx", "editor-password", &editor).await;
    fixture.insert_user("e2@kothler.mx", "editor-password", &editor).await;

    let response = fixture.send("DELETE", &format!("/api/roles/{}", editor.id), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "IN_USE");
    assert_eq!(body["count"], 2);
    assert!(fixture.role_repo.find_by_id(&editor.id).await.unwrap().is_some());

    let unused = Role::new("viewer", "Read only");
    fixture.role_repo.insert(&unused).await.unwrap();
    let response = fixture.send("DELETE", &format!("/api/roles/{}", unused.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(fixture.role_repo.find_by_id(&unused.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_package_display_order_appends() {
    let fixture = Fixture::start().await;

    let first = json_body(fixture.send("POST", "/api/packages", Some(package_body("basic"))).await).await;
    assert_eq!(first["package"]["displayOrder"], 0);

    let id = first["package"]["id"].as_str().unwrap().to_string();
    let response = fixture.send("PUT", &format!("/api/packages/{}", id), Some(json!({ "displayOrder": 9 }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let second = json_body(fixture.send("POST", "/api/packages", Some(package_body("pro"))).await).await;
    assert_eq!(second["package"]["displayOrder"], 10);
    assert_eq!(fixture.package_repo.max_display_order().await.unwrap(), Some(10));
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_package_display_order_at_maximum_is_rejected() {
    let fixture = Fixture::start().await;

    let first = json_body(fixture.send("POST", "/api/packages", Some(package_body("basic"))).await).await;
    let id = first["package"]["id"].as_str().unwrap().to_string();
    fixture.send("PUT", &format!("/api/packages/{}", id), Some(json!({ "displayOrder": i32::MAX }))).await;

    let response = fixture.send("POST", "/api/packages", Some(package_body("pro"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "VALIDATION_ERROR");
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_login_records_last_login_and_sets_cookie() {
    let fixture = Fixture::start().await;
    let user = fixture.insert_user("ana@kothler.mx", "ana-password", &fixture.admin_role).await;
    assert!(user.last_login.is_none());

    let request = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": " ANA@kothler.mx ", "password": "ana-password" }).to_string()))
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("kt_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains(&format!("Max-Age={}", SESSION_SECS)));

    let body = json_body(response).await;
    let claims = fixture.auth_service.validate_token(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.exp - claims.iat, SESSION_SECS);

    let stored = fixture.user_repo.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(stored.last_login.is_some());
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_wrong_password_is_401_without_login_update() {
    let fixture = Fixture::start().await;
    let user = fixture.insert_user("ana@kothler.mx", "ana-password", &fixture.admin_role).await;

    let request = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "ana@kothler.mx", "password": "wrong-password" }).to_string()))
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let stored = fixture.user_repo.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(stored.last_login.is_none());
}

#[tokio::test]
#[ignore = "needs a Docker daemon"]
async fn test_user_update_invalidates_user_and_profile_caches() {
    let fixture = Fixture::start().await;
    let user = fixture.insert_user("ana@kothler.mx", "ana-password", &fixture.admin_role).await;

    let user_key = CacheEntity::Users.item_key(&user.id);
    let profile_list = CacheEntity::Profiles.public_list_key();
    let profile_item = CacheEntity::Profiles.item_key("0PPPPPPPPPPPP");
    for key in [&user_key, &profile_list, &profile_item] {
        fixture.cache.set(key, &json!({ "name": "Test User" }), None).await;
    }

    let response = fixture.send("PUT", &format!("/api/users/{}", user.id), Some(json!({ "name": "Ana María" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["user"]["name"], "Ana María");

    for key in [&user_key, &profile_list, &profile_item] {
        assert!(!fixture.cache.exists(key).await, "{} should be invalidated", key);
    }
}
