//! # Sweep API Handlers
//!
//! Manual triggers for the retention sweeps, mirroring what the scheduler
//! runs on its tick.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::error::ApiError;
use crate::retention::{SweepKind, SweepReport};
use crate::server::AppState;

/// Run one retention sweep immediately
#[utoipa::path(
    post,
    path = "/sweeps/{name}",
    params(("name" = String, Path, description = "Sweep name: external-archive, stale-archive, auto-close, or prune-locations")),
    responses(
        (status = 200, description = "Sweep report", body = SweepReport),
        (status = 404, description = "Unknown sweep name", body = ApiError)
    ),
    tag = "sweeps"
)]
pub async fn trigger_sweep(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SweepReport>, ApiError> {
    let kind = SweepKind::parse(&name).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Unknown sweep '{}'", name),
        )
    })?;

    let report = state.retention.run_sweep(kind).await?;
    Ok(Json(report))
}
