//! Retention scheduler.
//!
//! Four time-windowed sweeps keep the live tables bounded: external-feed
//! archival, stale-call archival into `call_history`, auto-close of lingering
//! `Cleared` calls, and location-history pruning. Every sweep is idempotent
//! and tolerates an empty candidate set, so overlapping or repeated runs are
//! harmless. The sweeps run from a periodic tick loop and can also be
//! triggered individually over HTTP.

use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::RetentionConfig;
use crate::models::{
    CallStatus, call_history, call_status_log, dispatch_call, unit_location_history,
};

/// The four retention sweeps, named as they appear in the manual-trigger API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SweepKind {
    ExternalArchive,
    StaleArchive,
    AutoClose,
    PruneLocations,
}

impl SweepKind {
    pub const ALL: [SweepKind; 4] = [
        SweepKind::ExternalArchive,
        SweepKind::StaleArchive,
        SweepKind::AutoClose,
        SweepKind::PruneLocations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::ExternalArchive => "external-archive",
            SweepKind::StaleArchive => "stale-archive",
            SweepKind::AutoClose => "auto-close",
            SweepKind::PruneLocations => "prune-locations",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "external-archive" => Some(SweepKind::ExternalArchive),
            "stale-archive" => Some(SweepKind::StaleArchive),
            "auto-close" => Some(SweepKind::AutoClose),
            "prune-locations" => Some(SweepKind::PruneLocations),
            _ => None,
        }
    }
}

impl std::fmt::Display for SweepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sweep run. `window_start` is the oldest timestamp a row may
/// carry and still be retained; everything before it was in scope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SweepReport {
    pub sweep: SweepKind,
    /// Rows the sweep acted on
    pub count: u64,
    #[schema(value_type = String, format = DateTime)]
    pub window_start: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub window_end: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub ran_at: DateTimeWithTimeZone,
    /// Wall-clock run time of the sweep
    pub duration_ms: u64,
}

/// Owns the periodic sweep loop and the individual sweep implementations.
#[derive(Clone)]
pub struct RetentionScheduler {
    db: DatabaseConnection,
    config: RetentionConfig,
}

impl RetentionScheduler {
    pub fn new(db: DatabaseConnection, config: RetentionConfig) -> Self {
        Self { db, config }
    }

    /// Tick loop; returns when the token is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.tick_interval_seconds));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            tick_seconds = self.config.tick_interval_seconds,
            "retention scheduler started"
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("retention scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.run_all().await;
                }
            }
        }
    }

    /// Run every sweep once. A failing sweep is logged and the rest still
    /// run.
    pub async fn run_all(&self) -> Vec<SweepReport> {
        let mut reports = Vec::with_capacity(SweepKind::ALL.len());
        for kind in SweepKind::ALL {
            match self.run_sweep(kind).await {
                Ok(report) => reports.push(report),
                Err(err) => error!(sweep = %kind, error = %err, "sweep failed"),
            }
        }
        reports
    }

    pub async fn run_sweep(&self, kind: SweepKind) -> Result<SweepReport, DbErr> {
        let started = std::time::Instant::now();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let (count, window_start) = match kind {
            SweepKind::ExternalArchive => self.sweep_external_archive(now).await?,
            SweepKind::StaleArchive => self.sweep_stale_archive(now).await?,
            SweepKind::AutoClose => self.sweep_auto_close(now).await?,
            SweepKind::PruneLocations => self.sweep_prune_locations(now).await?,
        };

        counter!("dispatch_sweep_rows_total", "sweep" => kind.as_str()).increment(count);
        if count > 0 {
            info!(sweep = %kind, count, "sweep completed");
        } else {
            debug!(sweep = %kind, "sweep completed, nothing to do");
        }

        Ok(SweepReport {
            sweep: kind,
            count,
            window_start,
            window_end: now,
            ran_at: now,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Flag old external-feed calls as archived without touching their
    /// status or assignments.
    async fn sweep_external_archive(
        &self,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, DateTimeWithTimeZone), DbErr> {
        let cutoff = now - chrono::Duration::minutes(self.config.external_archive_minutes as i64);

        let result = dispatch_call::Entity::update_many()
            .col_expr(dispatch_call::Column::Archived, Expr::value(true))
            .col_expr(dispatch_call::Column::ArchivedAt, Expr::value(Some(now)))
            .col_expr(dispatch_call::Column::UpdatedAt, Expr::value(now))
            .filter(dispatch_call::Column::Archived.eq(false))
            .filter(dispatch_call::Column::Source.is_in(self.config.external_sources.clone()))
            .filter(dispatch_call::Column::TimeReceived.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok((result.rows_affected, cutoff))
    }

    /// Move long-lived active calls into `call_history` and delete the live
    /// row. The history write happens before the delete, so a failure leaves
    /// the live row behind for the next run rather than losing the call.
    async fn sweep_stale_archive(
        &self,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, DateTimeWithTimeZone), DbErr> {
        let cutoff = now - chrono::Duration::minutes(self.config.stale_archive_minutes as i64);

        let candidates = dispatch_call::Entity::find()
            .filter(dispatch_call::Column::Archived.eq(false))
            .filter(dispatch_call::Column::TimeReceived.lt(cutoff))
            .all(&self.db)
            .await?;

        let mut moved = 0u64;
        for call in candidates {
            match self.archive_one_call(&call, now).await {
                Ok(()) => moved += 1,
                Err(err) => {
                    warn!(call_id = %call.id, error = %err, "stale archival skipped call");
                }
            }
        }
        Ok((moved, cutoff))
    }

    async fn archive_one_call(
        &self,
        call: &dispatch_call::Model,
        now: DateTimeWithTimeZone,
    ) -> Result<(), DbErr> {
        // A history row may already exist if a prior run died between the
        // insert and the delete.
        let already_archived = call_history::Entity::find_by_id(call.id)
            .one(&self.db)
            .await?
            .is_some();
        if !already_archived {
            call_history::ActiveModel {
                id: Set(call.id),
                incident_type: Set(call.incident_type.clone()),
                location_text: Set(call.location_text.clone()),
                lat: Set(call.lat),
                lon: Set(call.lon),
                final_status: Set(call.status.clone()),
                priority: Set(call.priority.clone()),
                source: Set(call.source.clone()),
                time_received: Set(call.time_received),
                time_closed: Set(call.time_closed),
                archived_at: Set(now),
                created_at: Set(now),
            }
            .insert(&self.db)
            .await?;
        }

        dispatch_call::Entity::delete_by_id(call.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Promote `Cleared` calls past the grace period to `Closed`, with a
    /// system-attributed log row.
    async fn sweep_auto_close(
        &self,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, DateTimeWithTimeZone), DbErr> {
        let cutoff = now - chrono::Duration::minutes(self.config.auto_close_grace_minutes as i64);

        // Archived rows belong to the archival sweeps and stay untouched.
        let candidates = dispatch_call::Entity::find()
            .filter(dispatch_call::Column::Archived.eq(false))
            .filter(dispatch_call::Column::Status.eq(CallStatus::Cleared.as_str()))
            .filter(dispatch_call::Column::TimeCleared.lt(cutoff))
            .all(&self.db)
            .await?;

        let mut closed = 0u64;
        for call in candidates {
            let call_id = call.id;
            match self.close_one_call(call, now).await {
                Ok(()) => closed += 1,
                Err(err) => {
                    warn!(call_id = %call_id, error = %err, "auto-close skipped call");
                }
            }
        }
        Ok((closed, cutoff))
    }

    async fn close_one_call(
        &self,
        call: dispatch_call::Model,
        now: DateTimeWithTimeZone,
    ) -> Result<(), DbErr> {
        let call_id = call.id;
        let time_closed = call.time_closed;
        let mut active = call.into_active_model();
        active.status = Set(CallStatus::Closed.as_str().to_string());
        if time_closed.is_none() {
            active.time_closed = Set(Some(now));
        }
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        call_status_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            call_id: Set(call_id),
            old_status: Set(CallStatus::Cleared.as_str().to_string()),
            new_status: Set(CallStatus::Closed.as_str().to_string()),
            changed_by_unit_id: Set(None),
            note: Set(Some("auto-closed after clearance grace period".to_string())),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Delete location samples past the retention horizon.
    async fn sweep_prune_locations(
        &self,
        now: DateTimeWithTimeZone,
    ) -> Result<(u64, DateTimeWithTimeZone), DbErr> {
        let cutoff = now - chrono::Duration::hours(self.config.location_retention_hours as i64);

        let result = unit_location_history::Entity::delete_many()
            .filter(unit_location_history::Column::RecordedAt.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok((result.rows_affected, cutoff))
    }
}
