//! Health Check Endpoints
//!
//! - /health - Combined health status
//! - /health/live - Liveness probe
//! - /health/ready - Readiness probe

use axum::{
    routing::get,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use utoipa::ToSchema;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use chrono::{DateTime, Utc};

use crate::cache::CacheService;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
    /// Serving, with a non-critical dependency failing
    Degraded,
}

/// Individual health check result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,

    pub status: HealthStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Full health response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Health check dependencies
pub trait HealthChecker: Send + Sync {
    fn check(&self) -> impl std::future::Future<Output = HealthCheck> + Send;
}

/// MongoDB ping; a failure takes the service down
pub struct MongoHealthChecker<'a> {
    pub db: &'a mongodb::Database,
}

impl HealthChecker for MongoHealthChecker<'_> {
    async fn check(&self) -> HealthCheck {
        let start = Instant::now();

        let (status, message) = match self.db.run_command(mongodb::bson::doc! { "ping": 1 }).await {
            Ok(_) => (HealthStatus::Up, None),
            Err(e) => (HealthStatus::Down, Some(format!("Connection failed: {}", e))),
        };

        HealthCheck {
            name: "mongodb".to_string(),
            status,
            message,
            duration_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}

/// Cache ping; a failure only degrades the service
pub struct CacheHealthChecker<'a> {
    pub cache: &'a CacheService,
}

impl HealthChecker for CacheHealthChecker<'_> {
    async fn check(&self) -> HealthCheck {
        let start = Instant::now();

        let (status, message) = match self.cache.ping().await {
            Ok(()) => (HealthStatus::Up, None),
            Err(e) => (HealthStatus::Degraded, Some(e)),
        };

        HealthCheck {
            name: format!("cache:{}", self.cache.backend()),
            status,
            message,
            duration_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}

fn combine(checks: &[HealthCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Down) {
        HealthStatus::Down
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Up
    }
}

/// Health service state
#[derive(Clone)]
pub struct HealthState {
    pub db: Option<mongodb::Database>,
    pub cache: Option<CacheService>,
    pub version: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Set once startup (indexes, seeding) has finished
    pub ready: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(db: Option<mongodb::Database>, version: Option<String>) -> Self {
        Self {
            db,
            cache: None,
            version,
            started_at: Utc::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn run_checks(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();
        if let Some(db) = &self.db {
            checks.push(MongoHealthChecker { db }.check().await);
        }
        if let Some(cache) = &self.cache {
            checks.push(CacheHealthChecker { cache }.check().await);
        }
        checks
    }
}

fn status_code(status: HealthStatus) -> StatusCode {
    if status == HealthStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Combined health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up or degraded", body = HealthResponse),
        (status = 503, description = "Service is down", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<HealthState>) -> Response {
    let checks = state.run_checks().await;
    let mut status = combine(&checks);
    if !state.is_ready() && status == HealthStatus::Up {
        status = HealthStatus::Degraded;
    }

    let response = HealthResponse {
        status,
        timestamp: Utc::now(),
        version: state.version.clone(),
        checks,
    };

    (status_code(status), Json(response)).into_response()
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = SimpleHealthResponse)
    )
)]
pub async fn get_liveness() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse { status: HealthStatus::Up })
}

/// Readiness probe
///
/// 503 until startup has finished or while MongoDB is unreachable. A failing
/// cache does not make the service unready.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = SimpleHealthResponse),
        (status = 503, description = "Service is not ready", body = SimpleHealthResponse)
    )
)]
pub async fn get_readiness(State(state): State<HealthState>) -> Response {
    let status = if state.is_ready() {
        match &state.db {
            Some(db) => {
                let check = MongoHealthChecker { db }.check().await;
                match check.status {
                    HealthStatus::Up => HealthStatus::Up,
                    _ => HealthStatus::Down,
                }
            }
            None => HealthStatus::Up,
        }
    } else {
        HealthStatus::Down
    };

    (status_code(status), Json(SimpleHealthResponse { status })).into_response()
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(get_health))
        .route("/live", get(get_liveness))
        .route("/ready", get(get_readiness))
        .with_state(state)
}
