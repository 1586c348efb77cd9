//! Auth API Endpoints
//!
//! - POST /auth/login - Password login, issues the session cookie
//! - POST /auth/logout - Clears the session cookie
//! - GET /auth/me - Current session

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::auth_service::AuthService;
use crate::auth::password_service::PasswordService;
use crate::role::repository::RoleRepository;
use crate::user::entity::normalize_email;
use crate::user::repository::UserRepository;
use crate::shared::authorization_service::AuthContext;
use crate::shared::api_common::ApiJson;
use crate::shared::error::PlatformError;
use crate::shared::middleware::{Authenticated, DEFAULT_SESSION_COOKIE};

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// The user a session belongs to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Role name
    pub role: String,
    pub permissions: Vec<String>,
}

impl From<&AuthContext> for SessionUser {
    fn from(ctx: &AuthContext) -> Self {
        let mut permissions: Vec<String> = ctx.permissions.iter().cloned().collect();
        permissions.sort();
        Self {
            id: ctx.user_id.clone(),
            email: ctx.email.clone(),
            name: ctx.name.clone(),
            role: ctx.role.clone(),
            permissions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: SessionUser,
    /// Session token, also set as an HttpOnly cookie
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: SessionUser,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub user_repo: Arc<UserRepository>,
    pub role_repo: Arc<RoleRepository>,
    pub password_service: Arc<PasswordService>,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub session_cookie_same_site: String,
}

impl AuthState {
    pub fn new(
        auth_service: Arc<AuthService>,
        user_repo: Arc<UserRepository>,
        role_repo: Arc<RoleRepository>,
        password_service: Arc<PasswordService>,
    ) -> Self {
        Self {
            auth_service,
            user_repo,
            role_repo,
            password_service,
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_cookie_secure: false,
            session_cookie_same_site: "Lax".to_string(),
        }
    }

    pub fn with_session_cookie_settings(mut self, name: &str, secure: bool, same_site: &str) -> Self {
        self.session_cookie_name = name.to_string();
        self.session_cookie_secure = secure;
        self.session_cookie_same_site = same_site.to_string();
        self
    }

    /// HttpOnly session cookie living as long as the token
    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.session_cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.session_cookie_secure)
            .same_site(self.same_site())
            .max_age(time::Duration::seconds(self.auth_service.session_expiry_secs()))
            .build()
    }

    fn same_site(&self) -> SameSite {
        match self.session_cookie_same_site.to_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        }
    }
}

/// Login with email and password
///
/// Unknown users, inactive users, wrong passwords and dangling roles all
/// answer the same 401.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postApiAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(PlatformError::validation("Email and password are required"));
    }

    let email = normalize_email(&req.email);
    let user = match state.user_repo.find_by_email(&email).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!(email = %email, "Login rejected: no active user");
            return Err(PlatformError::InvalidCredentials);
        }
    };

    let password_valid = state.password_service
        .verify_password(&req.password, &user.password)
        .unwrap_or(false);
    if !password_valid {
        return Err(PlatformError::InvalidCredentials);
    }

    let role = state.role_repo.find_by_id(&user.role).await?
        .ok_or_else(|| {
            warn!(user_id = %user.id, role_id = %user.role, "Login rejected: role not found");
            PlatformError::InvalidCredentials
        })?;

    state.user_repo.set_last_login(&user.id, chrono::Utc::now()).await?;

    let token = state.auth_service.generate_session_token(&user, &role)?;

    let jar = jar.add(state.session_cookie(token.clone()));

    info!(user_id = %user.id, role = %role.name, "User logged in");

    let response = LoginResponse {
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: role.name,
            permissions: role.permissions,
        },
        token,
    };

    Ok((jar, Json(response)))
}

/// Logout
///
/// Clears the session cookie. Works with or without a valid session.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    operation_id = "postApiAuthLogout",
    responses(
        (status = 204, description = "Logout successful")
    )
)]
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let cookie = Cookie::build((state.session_cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .build();

    (jar.add(cookie), StatusCode::NO_CONTENT)
}

/// Current session
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    operation_id = "getApiAuthMe",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(auth: Authenticated) -> Json<MeResponse> {
    Json(MeResponse { user: SessionUser::from(&auth.0) })
}

pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(get_current_user))
        .with_state(state)
}
