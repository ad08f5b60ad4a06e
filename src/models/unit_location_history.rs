//! Unit location history entity model
//!
//! Append-only breadcrumb samples. Doubles as the "previous position"
//! reference for geofence transition detection and is pruned past the
//! retention horizon by the sweep.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "unit_location_history")]
pub struct Model {
    /// Unique identifier for the sample (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub unit_id: Uuid,

    pub lat: f64,

    pub lon: f64,

    /// Reported ground speed, when the device provides one
    pub speed_mph: Option<f64>,

    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
