//! # Call API Handlers
//!
//! Intake, listing, and unit recommendations for dispatch calls.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::geo;
use crate::lifecycle;
use crate::models::dispatch_call::Model as DispatchCallModel;
use crate::models::{AssignmentRole, CallPriority, CallStatus};
use crate::ranking::{self, UnitRecommendation};
use crate::repositories::{CreateCallRequest, DispatchCallRepository, UnitRepository};
use crate::server::AppState;

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 200;

/// Request payload for creating a call
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCallDto {
    /// Free-text incident description
    #[schema(example = "Armed robbery in progress")]
    pub incident_type: String,
    /// Human-readable location
    #[schema(example = "900 E Broad St")]
    pub location_text: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Severity; classified from the incident text when omitted
    pub priority: Option<CallPriority>,
    /// Origin feed slug; defaults to "internal"
    pub source: Option<String>,
    /// Upstream identifier for externally-sourced calls
    pub external_ref: Option<String>,
}

/// A dispatch call as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct CallDto {
    pub id: Uuid,
    pub incident_type: String,
    pub location_text: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[schema(example = "Dispatched")]
    pub status: String,
    #[schema(example = "high")]
    pub priority: String,
    pub source: String,
    pub external_ref: Option<String>,
    pub time_received: String,
    pub time_enroute: Option<String>,
    pub time_on_scene: Option<String>,
    pub time_cleared: Option<String>,
    pub time_closed: Option<String>,
    pub archived: bool,
}

impl From<DispatchCallModel> for CallDto {
    fn from(model: DispatchCallModel) -> Self {
        Self {
            id: model.id,
            incident_type: model.incident_type,
            location_text: model.location_text,
            lat: model.lat,
            lon: model.lon,
            status: model.status,
            priority: model.priority,
            source: model.source,
            external_ref: model.external_ref,
            time_received: model.time_received.to_rfc3339(),
            time_enroute: model.time_enroute.map(|t| t.to_rfc3339()),
            time_on_scene: model.time_on_scene.map(|t| t.to_rfc3339()),
            time_cleared: model.time_cleared.map(|t| t.to_rfc3339()),
            time_closed: model.time_closed.map(|t| t.to_rfc3339()),
            archived: model.archived,
        }
    }
}

/// Query parameters for listing calls
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListCallsQuery {
    /// Filter by call status (wire string, e.g. "On Scene")
    pub status: Option<String>,
    /// Maximum rows to return (default 50, cap 200)
    pub limit: Option<u64>,
}

/// Create a dispatch call
#[utoipa::path(
    post,
    path = "/calls",
    request_body = CreateCallDto,
    responses(
        (status = 201, description = "Call created", body = CallDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Duplicate external reference", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "calls"
)]
pub async fn create_call(
    State(state): State<AppState>,
    Json(request): Json<CreateCallDto>,
) -> Result<(StatusCode, Json<CallDto>), ApiError> {
    if request.incident_type.trim().is_empty() {
        return Err(validation_error(
            "Incident type is required",
            json!({ "field": "incident_type" }),
        ));
    }
    if request.location_text.trim().is_empty() {
        return Err(validation_error(
            "Location text is required",
            json!({ "field": "location_text" }),
        ));
    }
    match (request.lat, request.lon) {
        (Some(lat), Some(lon)) => geo::validate_coordinates(lat, lon)?,
        (None, None) => {}
        _ => {
            return Err(validation_error(
                "Latitude and longitude must be provided together",
                json!({ "fields": ["lat", "lon"] }),
            ));
        }
    }

    let repo = DispatchCallRepository::new(&state.db);
    let call = repo
        .create(CreateCallRequest {
            incident_type: request.incident_type.trim().to_string(),
            location_text: request.location_text.trim().to_string(),
            lat: request.lat,
            lon: request.lon,
            priority: request.priority,
            source: request.source,
            external_ref: request.external_ref,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(call.into())))
}

/// List active (non-archived) calls
#[utoipa::path(
    get,
    path = "/calls",
    params(ListCallsQuery),
    responses(
        (status = 200, description = "Active calls, newest first", body = [CallDto]),
        (status = 400, description = "Unknown status filter", body = ApiError)
    ),
    tag = "calls"
)]
pub async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<ListCallsQuery>,
) -> Result<Json<Vec<CallDto>>, ApiError> {
    let status = match &query.status {
        Some(value) => Some(CallStatus::parse(value).ok_or_else(|| {
            validation_error(
                "Unknown call status",
                json!({ "field": "status", "value": value }),
            )
        })?),
        None => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

    let repo = DispatchCallRepository::new(&state.db);
    let calls = repo.list_active(status, limit).await?;
    Ok(Json(calls.into_iter().map(CallDto::from).collect()))
}

/// Request payload for assigning a unit to a call
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignUnitDto {
    pub unit_id: Uuid,
    /// "primary" or "secondary"; defaults to primary
    #[schema(example = "primary")]
    pub role: Option<String>,
}

/// An assignment as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentDto {
    pub id: Uuid,
    pub call_id: Uuid,
    pub unit_id: Uuid,
    pub role: String,
    pub status: String,
    pub assigned_at: String,
}

/// Assign a unit to a call
#[utoipa::path(
    post,
    path = "/calls/{id}/assignments",
    params(("id" = Uuid, Path, description = "Call identifier")),
    request_body = AssignUnitDto,
    responses(
        (status = 201, description = "Unit assigned", body = AssignmentDto),
        (status = 400, description = "Unknown role", body = ApiError),
        (status = 404, description = "Call or unit not found", body = ApiError),
        (status = 409, description = "Call closed, unit already assigned, or primary taken", body = ApiError)
    ),
    tag = "calls"
)]
pub async fn assign_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignUnitDto>,
) -> Result<(StatusCode, Json<AssignmentDto>), ApiError> {
    let role = match &request.role {
        Some(value) => AssignmentRole::parse(value).ok_or_else(|| {
            validation_error(
                "Unknown assignment role",
                json!({ "field": "role", "value": value }),
            )
        })?,
        None => AssignmentRole::Primary,
    };

    let assignment = lifecycle::assign_unit(&state.db, id, request.unit_id, role).await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentDto {
            id: assignment.id,
            call_id: assignment.call_id,
            unit_id: assignment.unit_id,
            role: assignment.role,
            status: assignment.status,
            assigned_at: assignment.assigned_at.to_rfc3339(),
        }),
    ))
}

/// Recommendation response for a call
#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationsResponse {
    pub call_id: Uuid,
    pub recommendations: Vec<RecommendationDto>,
    /// Set when no unit is eligible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One ranked unit with display fields
#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationDto {
    /// 1-based position in the ranking
    pub rank: usize,
    pub unit_id: Uuid,
    pub unit_name: String,
    pub score: f64,
    pub distance_miles: f64,
    pub eta_minutes: u32,
    /// Formatted ETA for display
    #[schema(example = "4 min")]
    pub eta_text: String,
    pub matched_skills: Vec<String>,
    pub rationale: String,
}

impl RecommendationDto {
    fn from_ranked(rank: usize, rec: UnitRecommendation) -> Self {
        Self {
            rank,
            unit_id: rec.unit_id,
            unit_name: rec.unit_name,
            score: rec.score,
            distance_miles: rec.distance_miles,
            eta_minutes: rec.eta_minutes,
            eta_text: format!("{} min", rec.eta_minutes),
            matched_skills: rec.matched_skills,
            rationale: rec.rationale,
        }
    }
}

/// Rank units for a call
#[utoipa::path(
    post,
    path = "/calls/{id}/recommendations",
    params(("id" = Uuid, Path, description = "Call identifier")),
    responses(
        (status = 200, description = "Ranked unit recommendations", body = RecommendationsResponse),
        (status = 404, description = "Call not found", body = ApiError),
        (status = 409, description = "Call has no resolved coordinates", body = ApiError)
    ),
    tag = "calls"
)]
pub async fn recommend_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let call = DispatchCallRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Call {} not found", id),
            )
        })?;

    let (Some(lat), Some(lon)) = (call.lat, call.lon) else {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "Call has no resolved coordinates to rank against",
        ));
    };
    let priority = CallPriority::parse(&call.priority).unwrap_or(CallPriority::Low);

    let units = UnitRepository::new(&state.db).all().await?;
    let ranked = ranking::rank_units(
        lat,
        lon,
        priority,
        &call.incident_type,
        &units,
        &state.config.ranking,
    );

    metrics::counter!("dispatch_recommendations_total").increment(1);

    let message = ranked
        .is_empty()
        .then(|| "No eligible units available".to_string());
    Ok(Json(RecommendationsResponse {
        call_id: call.id,
        recommendations: ranked
            .into_iter()
            .enumerate()
            .map(|(i, rec)| RecommendationDto::from_ranked(i + 1, rec))
            .collect(),
        message,
    }))
}
