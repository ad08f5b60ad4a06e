//! Geofence transition monitor.
//!
//! Runs once per accepted location update, before the update is appended to
//! history. The previous containment state is derived from the newest prior
//! history sample inside a short trailing window rather than a stored flag,
//! so a unit that goes dark and reappears produces no spurious crossing.

use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GeofenceConfig;
use crate::geo::{self, METERS_PER_MILE};
use crate::models::{GeofenceEventType, geofence, geofence_event, unit, unit_location_history};

/// Detects fence crossings for accepted location updates.
#[derive(Clone)]
pub struct GeofenceMonitor {
    db: DatabaseConnection,
    config: GeofenceConfig,
}

impl GeofenceMonitor {
    pub fn new(db: DatabaseConnection, config: GeofenceConfig) -> Self {
        Self { db, config }
    }

    /// Evaluate a new position against every active fence, appending one
    /// `geofence_events` row per detected crossing. Must run before the new
    /// position is written to history.
    ///
    /// With no prior sample inside the trailing window the previous state is
    /// unknown and no event is produced for that fence.
    pub async fn check_position(
        &self,
        unit_row: &unit::Model,
        lat: f64,
        lon: f64,
        recorded_at: DateTimeWithTimeZone,
    ) -> Result<Vec<geofence_event::Model>, DbErr> {
        let fences = geofence::Entity::find()
            .filter(geofence::Column::Active.eq(true))
            .all(&self.db)
            .await?;
        if fences.is_empty() {
            return Ok(Vec::new());
        }

        let window_start =
            recorded_at - chrono::Duration::minutes(self.config.trailing_window_minutes as i64);
        let prior = unit_location_history::Entity::find()
            .filter(unit_location_history::Column::UnitId.eq(unit_row.id))
            .filter(unit_location_history::Column::RecordedAt.lt(recorded_at))
            .filter(unit_location_history::Column::RecordedAt.gte(window_start))
            .order_by_desc(unit_location_history::Column::RecordedAt)
            .one(&self.db)
            .await?;

        let mut events = Vec::new();
        for fence in fences {
            let Some(is_inside) = contains(&fence, lat, lon) else {
                continue;
            };
            let was_inside = match &prior {
                Some(sample) => match contains(&fence, sample.lat, sample.lon) {
                    Some(inside) => inside,
                    None => continue,
                },
                None => {
                    debug!(unit_id = %unit_row.id, fence = %fence.name, "no prior sample, state unknown");
                    continue;
                }
            };

            let event_type = match (was_inside, is_inside) {
                (false, true) if fence.alert_on_entry => GeofenceEventType::Entry,
                (true, false) if fence.alert_on_exit => GeofenceEventType::Exit,
                _ => continue,
            };

            let event = geofence_event::ActiveModel {
                id: Set(Uuid::new_v4()),
                event_type: Set(event_type.as_str().to_string()),
                geofence_id: Set(fence.id),
                geofence_name: Set(fence.name.clone()),
                unit_id: Set(unit_row.id),
                unit_name: Set(unit_row.name.clone()),
                lat: Set(lat),
                lon: Set(lon),
                occurred_at: Set(recorded_at),
                created_at: Set(recorded_at),
            }
            .insert(&self.db)
            .await?;

            info!(
                unit = %unit_row.name,
                fence = %fence.name,
                event = event_type.as_str(),
                "geofence crossing detected"
            );
            events.push(event);
        }
        Ok(events)
    }
}

/// Point-in-circle test; fences store radius in meters, distances are
/// computed in miles. `None` when the coordinates are invalid.
fn contains(fence: &geofence::Model, lat: f64, lon: f64) -> Option<bool> {
    let miles = geo::distance_miles(fence.lat, fence.lon, lat, lon).ok()?;
    Some(miles * METERS_PER_MILE <= fence.radius_meters)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use migration::Migrator;
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    use super::*;

    const FENCE_LAT: f64 = 37.5407;
    const FENCE_LON: f64 = -77.4360;
    // ~33 meters from center
    const INSIDE: (f64, f64) = (37.5410, -77.4360);
    // ~1 km from center
    const OUTSIDE: (f64, f64) = (37.5500, -77.4360);

    async fn setup() -> (DatabaseConnection, GeofenceMonitor) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let monitor = GeofenceMonitor::new(db.clone(), GeofenceConfig::default());
        (db, monitor)
    }

    async fn seed_fence(db: &DatabaseConnection, alert_on_entry: bool, alert_on_exit: bool) -> Uuid {
        let id = Uuid::new_v4();
        geofence::ActiveModel {
            id: Set(id),
            name: Set("Courthouse".to_string()),
            lat: Set(FENCE_LAT),
            lon: Set(FENCE_LON),
            radius_meters: Set(500.0),
            alert_on_entry: Set(alert_on_entry),
            alert_on_exit: Set(alert_on_exit),
            priority: Set("high".to_string()),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .unwrap();
        id
    }

    async fn seed_unit(db: &DatabaseConnection) -> unit::Model {
        let now: DateTimeWithTimeZone = Utc::now().into();
        unit::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Unit 7".to_string()),
            status: Set("On Patrol".to_string()),
            lat: Set(Some(OUTSIDE.0)),
            lon: Set(Some(OUTSIDE.1)),
            skills: Set(json!([])),
            is_supervisor: Set(false),
            current_call_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn seed_sample(
        db: &DatabaseConnection,
        unit_id: Uuid,
        (lat, lon): (f64, f64),
        minutes_ago: i64,
    ) {
        let now: DateTimeWithTimeZone = Utc::now().into();
        unit_location_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            unit_id: Set(unit_id),
            lat: Set(lat),
            lon: Set(lon),
            speed_mph: Set(None),
            recorded_at: Set(now - chrono::Duration::minutes(minutes_ago)),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn entry_detected_when_prior_sample_was_outside() {
        let (db, monitor) = setup().await;
        seed_fence(&db, true, true).await;
        let unit_row = seed_unit(&db).await;
        seed_sample(&db, unit_row.id, OUTSIDE, 2).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "entry");
        assert_eq!(events[0].unit_name, "Unit 7");
        assert_eq!(events[0].geofence_name, "Courthouse");
    }

    #[tokio::test]
    async fn exit_detected_when_prior_sample_was_inside() {
        let (db, monitor) = setup().await;
        seed_fence(&db, true, true).await;
        let unit_row = seed_unit(&db).await;
        seed_sample(&db, unit_row.id, INSIDE, 2).await;

        let events = monitor
            .check_position(&unit_row, OUTSIDE.0, OUTSIDE.1, Utc::now().into())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "exit");
    }

    #[tokio::test]
    async fn no_prior_sample_means_no_event() {
        let (db, monitor) = setup().await;
        seed_fence(&db, true, true).await;
        let unit_row = seed_unit(&db).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn stale_prior_sample_outside_window_is_ignored() {
        let (db, monitor) = setup().await;
        seed_fence(&db, true, true).await;
        let unit_row = seed_unit(&db).await;
        // Older than the 5-minute trailing window.
        seed_sample(&db, unit_row.id, OUTSIDE, 30).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn staying_inside_produces_no_event() {
        let (db, monitor) = setup().await;
        seed_fence(&db, true, true).await;
        let unit_row = seed_unit(&db).await;
        seed_sample(&db, unit_row.id, INSIDE, 2).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn entry_suppressed_when_fence_does_not_alert_on_entry() {
        let (db, monitor) = setup().await;
        seed_fence(&db, false, true).await;
        let unit_row = seed_unit(&db).await;
        seed_sample(&db, unit_row.id, OUTSIDE, 2).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn inactive_fences_are_skipped() {
        let (db, monitor) = setup().await;
        let fence_id = seed_fence(&db, true, true).await;
        let fence = geofence::Entity::find_by_id(fence_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut active_model: geofence::ActiveModel = fence.into();
        active_model.active = Set(false);
        active_model.update(&db).await.unwrap();

        let unit_row = seed_unit(&db).await;
        seed_sample(&db, unit_row.id, OUTSIDE, 2).await;

        let events = monitor
            .check_position(&unit_row, INSIDE.0, INSIDE.1, Utc::now().into())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn containment_uses_meter_radius() {
        let fence = geofence::Model {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            lat: FENCE_LAT,
            lon: FENCE_LON,
            radius_meters: 500.0,
            alert_on_entry: true,
            alert_on_exit: true,
            priority: "low".to_string(),
            active: true,
            created_at: Utc::now().into(),
        };
        assert_eq!(contains(&fence, INSIDE.0, INSIDE.1), Some(true));
        assert_eq!(contains(&fence, OUTSIDE.0, OUTSIDE.1), Some(false));
        assert_eq!(contains(&fence, f64::NAN, 0.0), None);
    }
}
