//! Geofence event entity model
//!
//! Append-only entry/exit detections. Fence and unit names are denormalized
//! onto the row so events remain readable after either is retired.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "geofence_events")]
pub struct Model {
    /// Unique identifier for the event (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Wire string of a `GeofenceEventType`
    pub event_type: String,

    pub geofence_id: Uuid,

    pub geofence_name: String,

    pub unit_id: Uuid,

    pub unit_name: String,

    /// Position that triggered the detection
    pub lat: f64,

    pub lon: f64,

    /// Timestamp of the triggering location update
    pub occurred_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
