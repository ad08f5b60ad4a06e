//! # Unit API Handlers
//!
//! Unit status updates (which drive the call lifecycle) and location
//! updates (which drive geofence detection).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::geo;
use crate::lifecycle;
use crate::models::UnitStatus;
use crate::repositories::UnitRepository;
use crate::server::AppState;

/// Request payload for a unit status update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    /// New unit status (wire string, e.g. "On Scene")
    #[schema(example = "Enroute")]
    pub status: String,
}

/// Result of a unit status update
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub unit_id: Uuid,
    pub unit_status: String,
    /// True when the update advanced the associated call
    pub call_status_updated: bool,
    /// New call status when a transition occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_status: Option<String>,
}

/// Apply a unit status update
#[utoipa::path(
    post,
    path = "/units/{id}/status",
    params(("id" = Uuid, Path, description = "Unit identifier")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status applied", body = UpdateStatusResponse),
        (status = 400, description = "Unknown status value", body = ApiError),
        (status = 404, description = "Unit not found", body = ApiError)
    ),
    tag = "units"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusDto>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    let status = UnitStatus::parse(&request.status).ok_or_else(|| {
        validation_error(
            "Unknown unit status",
            json!({ "field": "status", "value": request.status }),
        )
    })?;

    let outcome = lifecycle::apply_unit_status(&state.db, id, status).await?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        unit_id: outcome.unit_id,
        unit_status: outcome.new_status.as_str().to_string(),
        call_status_updated: outcome.call_transition.is_some(),
        call_status: outcome
            .call_transition
            .map(|t| t.new_status.as_str().to_string()),
    }))
}

/// Request payload for a unit location update
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationDto {
    pub lat: f64,
    pub lon: f64,
    /// Reported ground speed, if the device provides one
    pub speed_mph: Option<f64>,
}

/// A detected geofence crossing
#[derive(Debug, Serialize, ToSchema)]
pub struct GeofenceEventDto {
    #[schema(example = "entry")]
    pub event_type: String,
    pub geofence_id: Uuid,
    pub geofence_name: String,
    pub occurred_at: String,
}

/// Result of a location update
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateLocationResponse {
    pub success: bool,
    pub unit_id: Uuid,
    pub geofence_events: Vec<GeofenceEventDto>,
}

/// Accept a unit location update
///
/// Order matters: the geofence check reads prior history, so it runs before
/// the new sample is appended.
#[utoipa::path(
    post,
    path = "/units/{id}/location",
    params(("id" = Uuid, Path, description = "Unit identifier")),
    request_body = UpdateLocationDto,
    responses(
        (status = 200, description = "Location accepted", body = UpdateLocationResponse),
        (status = 400, description = "Invalid coordinates", body = ApiError),
        (status = 404, description = "Unit not found", body = ApiError)
    ),
    tag = "units"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationDto>,
) -> Result<Json<UpdateLocationResponse>, ApiError> {
    geo::validate_coordinates(request.lat, request.lon)?;

    let repo = UnitRepository::new(&state.db);
    let unit_row = repo.get(id).await?.ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            &format!("Unit {} not found", id),
        )
    })?;

    let recorded_at: DateTimeWithTimeZone = Utc::now().into();
    let events = state
        .geofence
        .check_position(&unit_row, request.lat, request.lon, recorded_at)
        .await?;

    repo.append_location(id, request.lat, request.lon, request.speed_mph, recorded_at)
        .await?;
    repo.update_position(unit_row, request.lat, request.lon)
        .await?;

    Ok(Json(UpdateLocationResponse {
        success: true,
        unit_id: id,
        geofence_events: events
            .into_iter()
            .map(|event| GeofenceEventDto {
                event_type: event.event_type,
                geofence_id: event.geofence_id,
                geofence_name: event.geofence_name,
                occurred_at: event.occurred_at.to_rfc3339(),
            })
            .collect(),
    }))
}
