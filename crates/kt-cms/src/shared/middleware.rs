//! API Middleware
//!
//! Session extraction for Axum handlers.
//! Supports both Bearer token (Authorization header) and session cookie authentication.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, header::COOKIE, request::Parts, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::{AuthContext, AuthService};
use crate::shared::error::PlatformError;

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "kt_session";

/// Shared session state injected by [`AuthLayer`]
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub session_cookie_name: String,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self {
            auth_service,
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session_cookie_name = name.into();
        self
    }

    /// Resolve the session carried by a request, if any
    fn authenticate(&self, parts: &Parts) -> Result<AuthContext, PlatformError> {
        let token = extract_token(parts, &self.session_cookie_name)
            .ok_or_else(|| PlatformError::unauthorized("Missing authentication token"))?;

        let claims = self.auth_service.validate_token(&token)?;
        Ok(AuthContext::from_claims(&claims))
    }
}

/// Token from the Authorization header first, then from the session cookie
fn extract_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    parts.headers
        .get(AUTHORIZATION)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(crate::auth::auth_service::extract_bearer_token)
        .map(String::from)
        .or_else(|| extract_session_cookie(parts, cookie_name))
}

fn extract_session_cookie(parts: &Parts, cookie_name: &str) -> Option<String> {
    parts.headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Authenticated user extractor
/// Rejects with 401 when the session is missing or invalid
pub struct Authenticated(pub AuthContext);

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>()
            .ok_or_else(|| PlatformError::internal("Auth service not configured"))?;

        app_state.authenticate(parts).map(Authenticated)
    }
}

/// Optional authentication extractor
/// Invalid or missing sessions resolve to `None`
pub struct OptionalAuth(pub Option<AuthContext>);

impl std::ops::Deref for OptionalAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(app_state) = parts.extensions.get::<AppState>() else {
            return Ok(OptionalAuth(None));
        };

        Ok(OptionalAuth(app_state.authenticate(parts).ok()))
    }
}

/// Layer that injects [`AppState`] into request extensions
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: (&str, &str)) -> Parts {
        let (parts, _) = Request::builder()
            .uri("/")
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let (parts, _) = Request::builder()
            .uri("/")
            .header("authorization", "Bearer from-header")
            .header("cookie", "kt_session=from-cookie")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_token(&parts, "kt_session").as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_name_must_match_exactly() {
        let parts = parts_with(("cookie", "kt_session_old=stale; kt_session=fresh"));
        assert_eq!(extract_session_cookie(&parts, "kt_session").as_deref(), Some("fresh"));

        let parts = parts_with(("cookie", "other=value"));
        assert_eq!(extract_session_cookie(&parts, "kt_session"), None);
    }

    #[test]
    fn test_empty_cookie_is_ignored() {
        let parts = parts_with(("cookie", "kt_session="));
        assert_eq!(extract_session_cookie(&parts, "kt_session"), None);
    }
}
