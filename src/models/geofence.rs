//! Geofence entity model
//!
//! A named circular alert zone. Read-only from the monitor's perspective;
//! membership is a point-in-circle test against center and radius.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "geofences")]
pub struct Model {
    /// Unique identifier for the geofence (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Center latitude
    pub lat: f64,

    /// Center longitude
    pub lon: f64,

    pub radius_meters: f64,

    pub alert_on_entry: bool,

    pub alert_on_exit: bool,

    /// Wire string of a `CallPriority`, used for alert display ordering
    pub priority: String,

    /// Inactive fences are skipped by the monitor entirely
    pub active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
