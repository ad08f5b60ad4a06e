//! # Server Configuration
//!
//! Router assembly, shared application state, and the serve loop.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::feed::FeedService;
use crate::geofence::GeofenceMonitor;
use crate::handlers;
use crate::retention::RetentionScheduler;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub feed: FeedService,
    pub retention: RetentionScheduler,
    pub geofence: GeofenceMonitor,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, crate::feed::FeedError> {
        let feed = FeedService::new(config.feed.clone())?;
        let retention = RetentionScheduler::new(db.clone(), config.retention.clone());
        let geofence = GeofenceMonitor::new(db.clone(), config.geofence.clone());
        Ok(Self {
            db,
            config: Arc::new(config),
            feed,
            retention,
            geofence,
        })
    }
}

/// Propagate or mint an `x-trace-id` and make it task-local for the request.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-trace-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let context = TraceContext {
        trace_id: trace_id.clone(),
    };
    let mut response = telemetry::with_trace_context(context, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("x-trace-id", value);
    }
    response
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/calls", post(handlers::calls::create_call))
        .route("/calls", get(handlers::calls::list_calls))
        .route(
            "/calls/{id}/assignments",
            post(handlers::calls::assign_unit),
        )
        .route(
            "/calls/{id}/recommendations",
            post(handlers::calls::recommend_units),
        )
        .route("/units/{id}/status", post(handlers::units::update_status))
        .route(
            "/units/{id}/location",
            post(handlers::units::update_location),
        )
        .route("/sweeps/{name}", post(handlers::sweeps::trigger_sweep))
        .route("/feed/{source}/refresh", post(handlers::feed::refresh_feed))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState::new(config, db)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::calls::create_call,
        crate::handlers::calls::list_calls,
        crate::handlers::calls::assign_unit,
        crate::handlers::calls::recommend_units,
        crate::handlers::units::update_status,
        crate::handlers::units::update_location,
        crate::handlers::sweeps::trigger_sweep,
        crate::handlers::feed::refresh_feed,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::CallStatus,
            crate::models::CallPriority,
            crate::models::UnitStatus,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::calls::CreateCallDto,
            crate::handlers::calls::CallDto,
            crate::handlers::calls::AssignUnitDto,
            crate::handlers::calls::AssignmentDto,
            crate::handlers::calls::RecommendationsResponse,
            crate::handlers::calls::RecommendationDto,
            crate::handlers::units::UpdateStatusDto,
            crate::handlers::units::UpdateStatusResponse,
            crate::handlers::units::UpdateLocationDto,
            crate::handlers::units::UpdateLocationResponse,
            crate::handlers::units::GeofenceEventDto,
            crate::retention::SweepKind,
            crate::retention::SweepReport,
            crate::handlers::feed::FeedRefreshResponse,
        )
    ),
    info(
        title = "Dispatch Coordination API",
        description = "Emergency dispatch coordination: call intake, unit ranking, lifecycle, retention, and geofencing",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
