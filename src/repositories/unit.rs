//! # Unit Repository
//!
//! Roster reads plus the two writes an accepted location update performs:
//! the history append and the unit-row position update. The geofence check
//! runs between them, so they are exposed separately.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel};
use uuid::Uuid;

use crate::models::unit::{self, Model as UnitModel};
use crate::models::unit_location_history;

/// Repository for unit roster and location persistence.
pub struct UnitRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UnitRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<UnitModel>, DbErr> {
        unit::Entity::find_by_id(id).one(self.db).await
    }

    pub async fn all(&self) -> Result<Vec<UnitModel>, DbErr> {
        unit::Entity::find().all(self.db).await
    }

    /// Append a breadcrumb sample.
    pub async fn append_location(
        &self,
        unit_id: Uuid,
        lat: f64,
        lon: f64,
        speed_mph: Option<f64>,
        recorded_at: DateTimeWithTimeZone,
    ) -> Result<(), DbErr> {
        unit_location_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            unit_id: Set(unit_id),
            lat: Set(lat),
            lon: Set(lon),
            speed_mph: Set(speed_mph),
            recorded_at: Set(recorded_at),
        }
        .insert(self.db)
        .await?;
        Ok(())
    }

    /// Update the unit row's last-known position.
    pub async fn update_position(
        &self,
        unit_row: UnitModel,
        lat: f64,
        lon: f64,
    ) -> Result<UnitModel, DbErr> {
        let mut active = unit_row.into_active_model();
        active.lat = Set(Some(lat));
        active.lon = Set(Some(lon));
        active.updated_at = Set(Utc::now().into());
        active.update(self.db).await
    }
}

#[cfg(test)]
mod tests {
    use migration::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    use super::*;

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_unit(db: &DatabaseConnection) -> UnitModel {
        let now: DateTimeWithTimeZone = Utc::now().into();
        unit::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Unit 3".to_string()),
            status: Set("Available".to_string()),
            lat: Set(None),
            lon: Set(None),
            skills: Set(json!(["EMS"])),
            is_supervisor: Set(false),
            current_call_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn location_update_appends_history_and_moves_unit() {
        let db = setup().await;
        let repo = UnitRepository::new(&db);
        let unit_row = seed_unit(&db).await;
        let unit_id = unit_row.id;

        repo.append_location(unit_id, 37.5, -77.4, Some(32.0), Utc::now().into())
            .await
            .unwrap();
        let updated = repo.update_position(unit_row, 37.5, -77.4).await.unwrap();

        assert_eq!(updated.lat, Some(37.5));
        assert_eq!(updated.lon, Some(-77.4));

        let samples = unit_location_history::Entity::find().all(&db).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].unit_id, unit_id);
        assert_eq!(samples[0].speed_mph, Some(32.0));
    }

    #[tokio::test]
    async fn roster_reads() {
        let db = setup().await;
        let repo = UnitRepository::new(&db);
        let unit_row = seed_unit(&db).await;

        assert_eq!(repo.all().await.unwrap().len(), 1);
        assert!(repo.get(unit_row.id).await.unwrap().is_some());
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
