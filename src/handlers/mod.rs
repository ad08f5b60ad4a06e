//! # API Handlers
//!
//! HTTP endpoint handlers for the dispatch coordination API.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db;
use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod calls;
pub mod feed;
pub mod sweeps;
pub mod units;

/// Health probe response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the service and its database are reachable
    #[schema(example = "ok")]
    pub status: &'static str,
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness/readiness probe; verifies database connectivity
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    db::health_check(&state.db)
        .await
        .map_err(|_| ApiError::from(ErrorType::ServiceUnavailable))?;
    Ok(Json(HealthResponse { status: "ok" }))
}
