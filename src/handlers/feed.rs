//! # Feed API Handlers
//!
//! Pulls a configured external incident feed through the TTL cache and
//! ingests its incidents as dispatch calls.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::feed;
use crate::server::AppState;

/// Result of a feed refresh
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedRefreshResponse {
    pub source: String,
    /// True when the upstream fetch failed and cached data was used
    pub stale: bool,
    pub fetched_at: String,
    /// Incidents in the snapshot
    pub fetched: usize,
    pub inserted: u64,
    pub duplicates: u64,
    pub skipped: u64,
}

/// Refresh one external feed
#[utoipa::path(
    post,
    path = "/feed/{source}/refresh",
    params(("source" = String, Path, description = "Configured feed source slug")),
    responses(
        (status = 200, description = "Feed refreshed (possibly from cache)", body = FeedRefreshResponse),
        (status = 404, description = "No feed configured for source", body = ApiError),
        (status = 502, description = "Feed unavailable and nothing cached", body = ApiError)
    ),
    tag = "feed"
)]
pub async fn refresh_feed(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<FeedRefreshResponse>, ApiError> {
    let snapshot = state.feed.fetch(&source).await?;
    let summary = feed::ingest_snapshot(&state.db, &snapshot).await?;

    Ok(Json(FeedRefreshResponse {
        source: snapshot.source,
        stale: snapshot.stale,
        fetched_at: snapshot.fetched_at.to_rfc3339(),
        fetched: snapshot.incidents.len(),
        inserted: summary.inserted,
        duplicates: summary.duplicates,
        skipped: summary.skipped,
    }))
}
