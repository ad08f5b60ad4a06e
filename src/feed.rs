//! External incident feed client, cache, and ingest.
//!
//! One configured URL per source slug, fetched as JSON through a read-through
//! TTL cache. A fetch failure serves the last-known-good snapshot marked
//! stale; with nothing cached the failure surfaces to the caller. Ingest
//! dedupes on (source, external_ref) so refreshing is safe to repeat.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use lru::LruCache;
use metrics::counter;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::models::{CallStatus, dispatch_call};
use crate::priority;

const CACHE_CAPACITY: usize = 16;

/// One incident as published by an upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedIncident {
    /// Upstream identifier, used for dedupe
    #[serde(alias = "external_id")]
    pub id: String,
    #[serde(alias = "type")]
    pub incident_type: String,
    #[serde(alias = "address", default)]
    pub location_text: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Upstream receive time; intake time is used when absent
    #[schema(value_type = Option<String>, format = DateTime)]
    pub received_at: Option<DateTimeWithTimeZone>,
}

/// A feed fetch result, possibly served from cache.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedSnapshot {
    pub source: String,
    pub incidents: Vec<FeedIncident>,
    /// True when the upstream fetch failed and this is cached data
    pub stale: bool,
    #[schema(value_type = String, format = DateTime)]
    pub fetched_at: DateTimeWithTimeZone,
}

/// What an ingest run did with a snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestSummary {
    pub source: String,
    pub inserted: u64,
    /// Incidents already present (matched on external_ref)
    pub duplicates: u64,
    /// Incidents skipped for missing/invalid fields
    pub skipped: u64,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no feed URL configured for source '{0}'")]
    UnknownSource(String),
    // The field cannot be named `source`: thiserror would treat it as the
    // error's source() and demand it implement Error.
    #[error("feed '{feed}' unavailable and nothing cached: {reason}")]
    Unavailable { feed: String, reason: String },
    #[error("failed to build feed HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

struct CacheEntry {
    incidents: Vec<FeedIncident>,
    fetched_at: DateTimeWithTimeZone,
    stored_at: Instant,
}

/// Read-through cache with per-entry TTL and last-known-good fallback.
///
/// Constructed once and carried in the application state; expired entries
/// are kept around so a failing upstream can still serve stale data.
#[derive(Clone)]
pub struct FeedCache {
    ttl: Duration,
    entries: Arc<Mutex<LruCache<String, CacheEntry>>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("capacity is non-zero"),
            ))),
        }
    }

    /// Entry younger than the TTL, if any.
    pub fn get_fresh(&self, source: &str) -> Option<(Vec<FeedIncident>, DateTimeWithTimeZone)> {
        let mut entries = self.entries.lock().expect("feed cache poisoned");
        let entry = entries.get(source)?;
        if entry.stored_at.elapsed() <= self.ttl {
            Some((entry.incidents.clone(), entry.fetched_at))
        } else {
            None
        }
    }

    /// Any entry regardless of age; the last-known-good fallback.
    pub fn get_any(&self, source: &str) -> Option<(Vec<FeedIncident>, DateTimeWithTimeZone)> {
        let mut entries = self.entries.lock().expect("feed cache poisoned");
        entries
            .get(source)
            .map(|entry| (entry.incidents.clone(), entry.fetched_at))
    }

    pub fn set(&self, source: &str, incidents: Vec<FeedIncident>, fetched_at: DateTimeWithTimeZone) {
        let mut entries = self.entries.lock().expect("feed cache poisoned");
        entries.put(
            source.to_string(),
            CacheEntry {
                incidents,
                fetched_at,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, source: &str) {
        let mut entries = self.entries.lock().expect("feed cache poisoned");
        entries.pop(source);
    }
}

/// Fetches configured feeds and writes their incidents into the call table.
#[derive(Clone)]
pub struct FeedService {
    http: reqwest::Client,
    cache: FeedCache,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        let cache = FeedCache::new(Duration::from_secs(config.cache_ttl_seconds));
        Ok(Self {
            http,
            cache,
            config,
        })
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Fetch a source through the cache.
    pub async fn fetch(&self, source: &str) -> Result<FeedSnapshot, FeedError> {
        let url = self
            .config
            .sources
            .get(source)
            .ok_or_else(|| FeedError::UnknownSource(source.to_string()))?;

        if let Some((incidents, fetched_at)) = self.cache.get_fresh(source) {
            debug!(source, count = incidents.len(), "feed served from cache");
            return Ok(FeedSnapshot {
                source: source.to_string(),
                incidents,
                stale: false,
                fetched_at,
            });
        }

        match self.fetch_upstream(url).await {
            Ok(incidents) => {
                let fetched_at: DateTimeWithTimeZone = Utc::now().into();
                self.cache.set(source, incidents.clone(), fetched_at);
                counter!("dispatch_feed_fetches_total", "source" => source.to_string(), "outcome" => "ok")
                    .increment(1);
                info!(source, count = incidents.len(), "feed fetched");
                Ok(FeedSnapshot {
                    source: source.to_string(),
                    incidents,
                    stale: false,
                    fetched_at,
                })
            }
            Err(err) => {
                counter!("dispatch_feed_fetches_total", "source" => source.to_string(), "outcome" => "error")
                    .increment(1);
                if let Some((incidents, fetched_at)) = self.cache.get_any(source) {
                    warn!(source, error = %err, "feed fetch failed, serving stale data");
                    Ok(FeedSnapshot {
                        source: source.to_string(),
                        incidents,
                        stale: true,
                        fetched_at,
                    })
                } else {
                    Err(FeedError::Unavailable {
                        feed: source.to_string(),
                        reason: err.to_string(),
                    })
                }
            }
        }
    }

    async fn fetch_upstream(&self, url: &str) -> Result<Vec<FeedIncident>, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<FeedIncident>>()
            .await
    }
}

/// Insert a snapshot's incidents as dispatch calls, deduping on
/// (source, external_ref). Incidents without usable fields are counted and
/// skipped, never abort the batch.
pub async fn ingest_snapshot(
    db: &DatabaseConnection,
    snapshot: &FeedSnapshot,
) -> Result<IngestSummary, FeedError> {
    let mut summary = IngestSummary {
        source: snapshot.source.clone(),
        inserted: 0,
        duplicates: 0,
        skipped: 0,
    };

    for incident in &snapshot.incidents {
        if incident.id.is_empty() || incident.incident_type.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let existing = dispatch_call::Entity::find()
            .filter(dispatch_call::Column::Source.eq(snapshot.source.as_str()))
            .filter(dispatch_call::Column::ExternalRef.eq(incident.id.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            summary.duplicates += 1;
            continue;
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let priority = priority::classify(&incident.incident_type);
        let result = dispatch_call::ActiveModel {
            id: Set(Uuid::new_v4()),
            incident_type: Set(incident.incident_type.clone()),
            location_text: Set(incident.location_text.clone()),
            lat: Set(incident.lat),
            lon: Set(incident.lon),
            status: Set(CallStatus::Dispatched.as_str().to_string()),
            priority: Set(priority.as_str().to_string()),
            source: Set(snapshot.source.clone()),
            external_ref: Set(Some(incident.id.clone())),
            time_received: Set(incident.received_at.unwrap_or(now)),
            time_enroute: Set(None),
            time_on_scene: Set(None),
            time_cleared: Set(None),
            time_closed: Set(None),
            archived: Set(false),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await;

        match result {
            Ok(_) => summary.inserted += 1,
            Err(err) => {
                warn!(source = %snapshot.source, external_ref = %incident.id, error = %err, "incident ingest skipped");
                summary.skipped += 1;
            }
        }
    }

    info!(
        source = %snapshot.source,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        "feed ingest completed"
    );
    Ok(summary)
}
